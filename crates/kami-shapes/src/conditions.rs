//! The declarative condition evaluator.
//!
//! A condition's logic is `<HANDLER>_<OPERATOR>`:
//!
//! | handler | measures |
//! |---|---|
//! | `CURR` | the holder's current value of `target.type` |
//! | `INC` | growth of that value since the objective's snapshot |
//! | `DEC` | decline of that value since the snapshot |
//! | `BOOL` | a yes/no predicate (state, completion, room) |
//!
//! | operator | passes when |
//! |---|---|
//! | `MIN` | measured `>=` target |
//! | `MAX` | measured `<=` target |
//! | `EQUAL` | measured `==` target |
//! | `IS` | measured is true / non-zero |
//! | `NOT` | measured is false / zero |
//!
//! Logic that does not parse fails closed: the condition is not completable,
//! a warning is logged and the session counts it. So does a condition whose
//! `for` names a holder kind (`ACCOUNT`, `KAMI`) other than the one it is
//! checked against. Any other `for` value is not enforced.

use std::fmt;
use std::str::FromStr;

use kami_store::entity::{EntityId, EntityIndex};
use serde::{Deserialize, Serialize};

use crate::components::*;
use crate::session::{Frame, Session};
use crate::shapes::account::Account;
use crate::shapes::condition::Condition;
use crate::shapes::item::MUSU_INDEX;
use crate::shapes::kami::{Kami, KamiState};
use crate::ShapeError;

// ---------------------------------------------------------------------------
// Logic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Handler {
    Curr,
    Inc,
    Dec,
    Bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    Min,
    Max,
    Equal,
    Is,
    Not,
}

impl Operator {
    /// Apply to a measured value.
    pub fn compare(self, measured: i64, target: i64) -> bool {
        match self {
            Operator::Min => measured >= target,
            Operator::Max => measured <= target,
            Operator::Equal => measured == target,
            Operator::Is => measured != 0,
            Operator::Not => measured == 0,
        }
    }
}

/// A parsed `<HANDLER>_<OPERATOR>` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Logic {
    pub handler: Handler,
    pub operator: Operator,
}

impl FromStr for Logic {
    type Err = ShapeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ShapeError::InvalidLogic {
            logic: s.to_owned(),
            reason: reason.to_owned(),
        };
        let (handler, operator) = s
            .split_once('_')
            .ok_or_else(|| invalid("expected <HANDLER>_<OPERATOR>"))?;
        let handler = match handler {
            "CURR" => Handler::Curr,
            "INC" => Handler::Inc,
            "DEC" => Handler::Dec,
            "BOOL" => Handler::Bool,
            _ => return Err(invalid("unknown handler, expected one of [CURR, INC, DEC, BOOL]")),
        };
        let operator = match operator {
            "MIN" => Operator::Min,
            "MAX" => Operator::Max,
            "EQUAL" => Operator::Equal,
            "IS" => Operator::Is,
            "NOT" => Operator::Not,
            _ => {
                return Err(invalid(
                    "unknown operator, expected one of [MIN, MAX, EQUAL, IS, NOT]",
                ))
            }
        };
        Ok(Logic { handler, operator })
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handler = match self.handler {
            Handler::Curr => "CURR",
            Handler::Inc => "INC",
            Handler::Dec => "DEC",
            Handler::Bool => "BOOL",
        };
        let operator = match self.operator {
            Operator::Min => "MIN",
            Operator::Max => "MAX",
            Operator::Equal => "EQUAL",
            Operator::Is => "IS",
            Operator::Not => "NOT",
        };
        write!(f, "{handler}_{operator}")
    }
}

// ---------------------------------------------------------------------------
// Holder
// ---------------------------------------------------------------------------

/// The entity a condition is checked against.
#[derive(Debug, Clone, Copy)]
pub enum Holder<'a> {
    Account(&'a Account),
    Kami(&'a Kami),
}

impl Holder<'_> {
    pub fn id(&self) -> EntityId {
        match self {
            Holder::Account(a) => a.id,
            Holder::Kami(k) => k.id,
        }
    }

    pub fn entity(&self) -> EntityIndex {
        match self {
            Holder::Account(a) => a.entity,
            Holder::Kami(k) => k.entity,
        }
    }

    pub fn room(&self) -> u32 {
        match self {
            Holder::Account(a) => a.room,
            Holder::Kami(k) => k.room,
        }
    }

    /// `ACCOUNT` or `KAMI`, as written in a condition's `for`.
    pub fn kind(&self) -> &'static str {
        match self {
            Holder::Account(_) => "ACCOUNT",
            Holder::Kami(_) => "KAMI",
        }
    }

    /// Whether a condition addressed `for` may be checked against this holder.
    pub fn accepts(&self, for_: Option<&str>) -> bool {
        match for_.map(|f| f.trim().to_ascii_uppercase()) {
            Some(f) if f == "ACCOUNT" || f == "KAMI" => f == self.kind(),
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionStatus {
    pub completable: bool,
    /// The measured value: current amount, delta, or 0/1 for predicates.
    /// `None` when the logic could not be evaluated.
    pub current: Option<i64>,
    pub target: Option<i64>,
}

impl ConditionStatus {
    fn failed(target: Option<i64>) -> Self {
        Self {
            completable: false,
            current: None,
            target,
        }
    }
}

// ---------------------------------------------------------------------------
// Measurement
// ---------------------------------------------------------------------------

fn saturate(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// The holder's current amount of `kind`.
fn current_value(session: &Session<'_>, holder: &Holder<'_>, kind: &str, index: Option<u32>) -> i64 {
    let id = holder.id();
    match (holder, kind) {
        (_, "ITEM") => saturate(session.inventory_balance(id, index.unwrap_or(0))),
        (_, "COIN" | "MUSU") => saturate(session.inventory_balance(id, MUSU_INDEX)),
        (_, "SKILL") => saturate(session.skill_points(id, index.unwrap_or(0))),
        (_, "ROOM") => i64::from(holder.room()),
        (Holder::Account(_), "KAMI") => saturate(session.kamis_owned_by(id).len() as u64),
        (Holder::Account(a), "REPUTATION") => saturate(a.reputation),
        (Holder::Account(a), "STAMINA") => a.current_stamina,
        (Holder::Kami(k), "LEVEL") => i64::from(k.level),
        (Holder::Kami(k), "HEALTH") => k.current_health,
        (Holder::Kami(k), "EXPERIENCE" | "XP") => saturate(k.xp),
        _ => saturate(session.data(id, index.unwrap_or(0), kind)),
    }
}

/// The holder's truth value of `kind`.
fn boolean_value(session: &Session<'_>, holder: &Holder<'_>, kind: &str, index: Option<u32>) -> bool {
    let id = holder.id();
    let state = match holder {
        Holder::Kami(k) => Some(k.state),
        Holder::Account(_) => None,
    };
    match kind {
        "QUEST" => session.data(id, index.unwrap_or(0), "QUEST_COMPLETE") > 0,
        "ROOM" => Some(holder.room()) == index,
        "RESTING" => state == Some(KamiState::Resting),
        "HARVESTING" => state == Some(KamiState::Harvesting),
        "DEAD" => state == Some(KamiState::Dead),
        "SKILL" => session.skill_points(id, index.unwrap_or(0)) > 0,
        _ => session.data(id, index.unwrap_or(0), kind) > 0,
    }
}

impl Session<'_> {
    /// The value recorded for `condition` when `holder` accepted it; zero
    /// when nothing was recorded.
    pub fn condition_snapshot(&self, holder: EntityId, condition: EntityId) -> i64 {
        self.resolve("condition.snapshot", &[holder.into(), condition.into()])
            .map(|e| self.i64_of(VALUE, e))
            .unwrap_or(0)
    }
}

fn evaluate(
    session: &Session<'_>,
    holder: &Holder<'_>,
    condition: &Condition,
    snapshot: Option<i64>,
) -> ConditionStatus {
    let target = condition.target.value;
    let logic = match condition.logic.parse::<Logic>() {
        Ok(logic) => logic,
        Err(err) => {
            session.note_unknown_handler();
            tracing::warn!(
                logic = %condition.logic,
                condition = %condition.id,
                error = %err,
                "condition logic not understood -- failing closed"
            );
            return ConditionStatus::failed(target);
        }
    };
    if !holder.accepts(condition.for_.as_deref()) {
        session.note_holder_mismatch();
        tracing::warn!(
            condition = %condition.id,
            expected = ?condition.for_,
            holder = holder.kind(),
            "condition checked against the wrong holder kind -- failing closed"
        );
        return ConditionStatus::failed(target);
    }

    let kind = condition.target.kind.as_str();
    let index = condition.target.index;
    let measured = match logic.handler {
        Handler::Curr => current_value(session, holder, kind, index),
        Handler::Bool => i64::from(boolean_value(session, holder, kind, index)),
        Handler::Inc | Handler::Dec => {
            let before =
                snapshot.unwrap_or_else(|| session.condition_snapshot(holder.id(), condition.id));
            let now = current_value(session, holder, kind, index);
            match logic.handler {
                Handler::Inc => now.saturating_sub(before),
                _ => before.saturating_sub(now),
            }
        }
    };

    ConditionStatus {
        completable: logic.operator.compare(measured, target.unwrap_or(0)),
        current: Some(measured),
        target,
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Check one condition. INC/DEC read their snapshot from the store.
pub fn check(frame: &Frame<'_, '_>, holder: Holder<'_>, condition: &Condition) -> ConditionStatus {
    evaluate(frame, &holder, condition, None)
}

/// Check one INC/DEC condition against an explicit snapshot.
pub fn check_with_snapshot(
    frame: &Frame<'_, '_>,
    holder: Holder<'_>,
    condition: &Condition,
    snapshot: i64,
) -> ConditionStatus {
    evaluate(frame, &holder, condition, Some(snapshot))
}

/// Whether every condition passes. Every condition is evaluated.
pub fn check_all(frame: &Frame<'_, '_>, holder: Holder<'_>, conditions: &[Condition]) -> bool {
    conditions
        .iter()
        .map(|c| check(frame, holder, c))
        .fold(true, |all, status| all & status.completable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{AccountSeed, ConditionSeed, KamiSeed, Seeder};
    use crate::shapes::account::get_account_by_index;
    use crate::shapes::kami::get_kami_by_index;
    use crate::shapes::options::{AccountOptions, KamiOptions};

    const NOW: u64 = 1_700_000_000;

    fn setup_world() -> kami_store::world::World {
        let mut seed = Seeder::new();
        seed.default_config();
        let owner = seed.account(AccountSeed {
            index: 1,
            name: "ava".into(),
            room: 6,
            reputation: 30,
            ..Default::default()
        });
        seed.inventory(owner, 11, 5);
        seed.inventory(owner, MUSU_INDEX, 15);
        seed.data(owner, 4, "QUEST_COMPLETE", 1);
        seed.data(owner, 0, "KILLS", 3);
        seed.kami(KamiSeed {
            index: 1,
            owner,
            level: 4,
            ..Default::default()
        });
        seed.into_world()
    }

    fn logic(raw: &str) -> Logic {
        raw.parse().unwrap()
    }

    #[test]
    fn logic_parses() {
        assert_eq!(
            logic("CURR_MIN"),
            Logic {
                handler: Handler::Curr,
                operator: Operator::Min
            }
        );
        assert_eq!(logic("BOOL_NOT").to_string(), "BOOL_NOT");
        assert!("CURRMIN".parse::<Logic>().is_err());
        assert!("HAVE_MIN".parse::<Logic>().is_err());
        assert!("CURR_ABOUT".parse::<Logic>().is_err());
    }

    #[test]
    fn curr_min_boundary() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let account = get_account_by_index(&frame, 1, &AccountOptions::default()).unwrap();
        let holder = Holder::Account(&account);

        let five = Condition::new("CURR_MIN", "ITEM", Some(11), Some(5));
        let six = Condition::new("CURR_MIN", "ITEM", Some(11), Some(6));
        assert!(check(&frame, holder, &five).completable);
        let status = check(&frame, holder, &six);
        assert!(!status.completable);
        assert_eq!(status.current, Some(5));
        assert_eq!(status.target, Some(6));
    }

    #[test]
    fn inc_uses_delta_from_snapshot() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let account = get_account_by_index(&frame, 1, &AccountOptions::default()).unwrap();
        let holder = Holder::Account(&account);

        let gain = Condition::new("INC_MIN", "COIN", None, Some(5));
        let status = check_with_snapshot(&frame, holder, &gain, 10);
        assert!(status.completable);
        assert_eq!(status.current, Some(5));
        assert!(!check_with_snapshot(&frame, holder, &gain, 11).completable);

        let spend = Condition::new("DEC_MIN", "COIN", None, Some(5));
        assert!(check_with_snapshot(&frame, holder, &spend, 20).completable);
    }

    #[test]
    fn inc_reads_stored_snapshot() {
        let mut seed = Seeder::new();
        let owner = seed.account(AccountSeed {
            index: 1,
            ..Default::default()
        });
        seed.inventory(owner, MUSU_INDEX, 40);
        let quest = EntityId::from(0x9u64);
        let condition = seed.condition(ConditionSeed {
            parent: quest,
            logic: "INC_MIN".into(),
            kind: "MUSU".into(),
            value: Some(25),
            ..Default::default()
        });
        seed.snapshot(owner, condition, 10);
        let world = seed.into_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let account = get_account_by_index(&frame, 1, &AccountOptions::default()).unwrap();

        let conditions = session.conditions_for(quest);
        let status = check(&frame, Holder::Account(&account), &conditions[0]);
        assert_eq!(status.current, Some(30));
        assert!(status.completable);
        assert_eq!(session.condition_snapshot(owner, EntityId::from(0xau64)), 0);
    }

    #[test]
    fn bool_and_fallback_counters() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let account = get_account_by_index(&frame, 1, &AccountOptions::default()).unwrap();
        let holder = Holder::Account(&account);

        assert!(check(&frame, holder, &Condition::new("BOOL_IS", "QUEST", Some(4), None)).completable);
        assert!(check(&frame, holder, &Condition::new("BOOL_NOT", "QUEST", Some(5), None)).completable);
        assert!(check(&frame, holder, &Condition::new("BOOL_IS", "ROOM", Some(6), None)).completable);
        assert!(check(&frame, holder, &Condition::new("CURR_EQUAL", "KILLS", None, Some(3))).completable);
        assert!(check(&frame, holder, &Condition::new("CURR_MAX", "REPUTATION", None, Some(30))).completable);
        assert!(check(&frame, holder, &Condition::new("CURR_MIN", "KAMI", None, Some(1))).completable);
    }

    #[test]
    fn kami_holder_dispatches_on_variant() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let kami = get_kami_by_index(&frame, 1, &KamiOptions::default()).unwrap();
        let holder = Holder::Kami(&kami);

        assert!(check(&frame, holder, &Condition::new("CURR_MIN", "LEVEL", None, Some(4))).completable);
        assert!(check(&frame, holder, &Condition::new("BOOL_IS", "RESTING", None, None)).completable);
        assert!(!check(&frame, holder, &Condition::new("BOOL_IS", "DEAD", None, None)).completable);
    }

    #[test]
    fn holder_kind_must_match_for() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let account = get_account_by_index(&frame, 1, &AccountOptions::default()).unwrap();
        let kami = get_kami_by_index(&frame, 1, &KamiOptions::default()).unwrap();

        let mut level = Condition::new("CURR_MIN", "LEVEL", None, Some(1));
        level.for_ = Some("KAMI".into());
        assert!(check(&frame, Holder::Kami(&kami), &level).completable);
        let status = check(&frame, Holder::Account(&account), &level);
        assert!(!status.completable);
        assert_eq!(status.current, None);
        assert_eq!(session.diagnostics().holder_mismatches, 1);

        let mut anyone = Condition::new("CURR_MIN", "ITEM", Some(11), Some(1));
        anyone.for_ = Some("PARTY".into());
        assert!(check(&frame, Holder::Account(&account), &anyone).completable);
        assert_eq!(session.diagnostics().holder_mismatches, 1);
    }

    #[test]
    fn unknown_logic_fails_closed_and_is_counted() {
        let world = setup_world();
        let session = Session::new(&world);
        let frame = session.frame(NOW);
        let account = get_account_by_index(&frame, 1, &AccountOptions::default()).unwrap();
        let holder = Holder::Account(&account);

        let bad = Condition::new("HAVE_MIN", "ITEM", Some(11), Some(0));
        let status = check(&frame, holder, &bad);
        assert!(!status.completable);
        assert_eq!(status.current, None);
        assert_eq!(session.diagnostics().unknown_handlers, 1);

        let good = Condition::new("CURR_MIN", "ITEM", Some(11), Some(1));
        assert!(check_all(&frame, holder, &[good.clone()]));
        assert!(!check_all(&frame, holder, &[good, bad]));
        assert!(check_all(&frame, holder, &[]));
        assert_eq!(session.diagnostics().unknown_handlers, 2);
    }
}
