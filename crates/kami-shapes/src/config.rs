//! Game tunables read from config entities.
//!
//! Each config value lives on the entity addressed by
//! `("is.config", NAME)`. Scalars are plain numbers; compound tunables are
//! packed config arrays (see [`unpack_config_array`]). Anything missing
//! decodes to zero so an unconfigured world degrades to neutral formulas.

use serde::{Deserialize, Serialize};

use crate::codec::{unpack_config_array, Precise};
use crate::components::VALUE;
use crate::ids::Arg;
use crate::session::Session;

pub const CONFIG_NAMESPACE: &str = "is.config";

// Config names.
pub const KAMI_REST_METABOLISM: &str = "KAMI_REST_METABOLISM";
pub const KAMI_HARV_FERTILITY: &str = "KAMI_HARV_FERTILITY";
pub const KAMI_HARV_EFFICACY: &str = "KAMI_HARV_EFFICACY";
pub const KAMI_HARV_INTENSITY: &str = "KAMI_HARV_INTENSITY";
pub const KAMI_HARV_STRAIN: &str = "KAMI_HARV_STRAIN";
pub const KAMI_LIQ_ANIMOSITY: &str = "KAMI_LIQ_ANIMOSITY";
pub const KAMI_LIQ_EFFICACY: &str = "KAMI_LIQ_EFFICACY";
pub const KAMI_LIQ_THRESHOLD: &str = "KAMI_LIQ_THRESHOLD";
pub const KAMI_LIQ_SALVAGE: &str = "KAMI_LIQ_SALVAGE";
pub const KAMI_LIQ_SPOILS: &str = "KAMI_LIQ_SPOILS";
pub const KAMI_LIQ_KARMA: &str = "KAMI_LIQ_KARMA";
pub const KAMI_LVL_REQ_MULT: &str = "KAMI_LVL_REQ_MULT";
pub const KAMI_LVL_REQ_BASE: &str = "KAMI_LVL_REQ_BASE";
pub const KAMI_STANDARD_COOLDOWN: &str = "KAMI_STANDARD_COOLDOWN";
pub const ACCOUNT_STAMINA_RECOVERY_PERIOD: &str = "ACCOUNT_STAMINA_RECOVERY_PERIOD";

// ---------------------------------------------------------------------------
// Layouts
// ---------------------------------------------------------------------------

/// A ratio with a separately tuned boost: `[ratio prec, ratio, boost prec, boost]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioBoost {
    pub ratio: Precise,
    pub boost: Precise,
}

impl RatioBoost {
    fn from_lanes(l: [i32; 8]) -> Self {
        Self {
            ratio: Precise::from_lanes(l[0], l[1]),
            boost: Precise::from_lanes(l[2], l[3]),
        }
    }
}

/// Affinity efficacy: `[prec, base, up, down]`, all in one precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Efficacy {
    pub precision: u32,
    pub base: i64,
    pub up: i64,
    pub down: i64,
}

impl Efficacy {
    fn from_lanes(l: [i32; 8]) -> Self {
        Self {
            precision: l[0].max(0) as u32,
            base: i64::from(l[1]),
            up: i64::from(l[2]),
            down: i64::from(l[3]),
        }
    }

    fn scale(&self) -> f64 {
        10f64.powi(self.precision as i32)
    }

    pub fn base(&self) -> f64 {
        self.base as f64 / self.scale()
    }

    pub fn up(&self) -> f64 {
        self.up as f64 / self.scale()
    }

    pub fn down(&self) -> f64 {
        self.down as f64 / self.scale()
    }
}

/// `[ratio prec, ratio, boost prec, boost, nudge prec, nudge]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StrainConfig {
    pub ratio: Precise,
    pub boost: Precise,
    /// Added to harmony so a zero-harmony kami does not divide by zero.
    pub nudge: Precise,
}

/// `[ratio prec, ratio, sigma prec, sigma]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimosityConfig {
    pub ratio: Precise,
    pub sigma: Precise,
}

/// Every tunable the kami formulas read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KamiConfig {
    pub metabolism: RatioBoost,
    pub fertility: RatioBoost,
    pub harvest_efficacy: Efficacy,
    pub intensity: RatioBoost,
    pub strain: StrainConfig,
    pub animosity: AnimosityConfig,
    pub liquidation_efficacy: Efficacy,
    pub threshold_shift: Precise,
    pub salvage: Precise,
    pub spoils: Precise,
    pub karma: Precise,
    pub level_base: u64,
    pub level_mult: Precise,
    pub cooldown: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Seconds per recovered stamina point.
    pub stamina_recovery_period: u64,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Session<'_> {
    /// A scalar config value; zero when unset.
    pub fn config_u64(&self, name: &str) -> u64 {
        self.resolve(CONFIG_NAMESPACE, &[Arg::Str(name)])
            .map(|e| self.u64_of(VALUE, e))
            .unwrap_or(0)
    }

    /// A packed config array; all-zero when unset.
    pub fn config_array(&self, name: &str) -> [i32; 8] {
        self.resolve(CONFIG_NAMESPACE, &[Arg::Str(name)])
            .and_then(|e| self.value(VALUE, e))
            .and_then(|v| v.as_u256())
            .map(unpack_config_array)
            .unwrap_or_default()
    }

    pub fn kami_config(&self) -> KamiConfig {
        let pair = |name: &str| {
            let l = self.config_array(name);
            Precise::from_lanes(l[0], l[1])
        };
        let strain = self.config_array(KAMI_HARV_STRAIN);
        let animosity = self.config_array(KAMI_LIQ_ANIMOSITY);

        KamiConfig {
            metabolism: RatioBoost::from_lanes(self.config_array(KAMI_REST_METABOLISM)),
            fertility: RatioBoost::from_lanes(self.config_array(KAMI_HARV_FERTILITY)),
            harvest_efficacy: Efficacy::from_lanes(self.config_array(KAMI_HARV_EFFICACY)),
            intensity: RatioBoost::from_lanes(self.config_array(KAMI_HARV_INTENSITY)),
            strain: StrainConfig {
                ratio: Precise::from_lanes(strain[0], strain[1]),
                boost: Precise::from_lanes(strain[2], strain[3]),
                nudge: Precise::from_lanes(strain[4], strain[5]),
            },
            animosity: AnimosityConfig {
                ratio: Precise::from_lanes(animosity[0], animosity[1]),
                sigma: Precise::from_lanes(animosity[2], animosity[3]),
            },
            liquidation_efficacy: Efficacy::from_lanes(self.config_array(KAMI_LIQ_EFFICACY)),
            threshold_shift: pair(KAMI_LIQ_THRESHOLD),
            salvage: pair(KAMI_LIQ_SALVAGE),
            spoils: pair(KAMI_LIQ_SPOILS),
            karma: pair(KAMI_LIQ_KARMA),
            level_base: self.config_u64(KAMI_LVL_REQ_BASE),
            level_mult: pair(KAMI_LVL_REQ_MULT),
            cooldown: self.config_u64(KAMI_STANDARD_COOLDOWN),
        }
    }

    pub fn account_config(&self) -> AccountConfig {
        AccountConfig {
            stamina_recovery_period: self.config_u64(ACCOUNT_STAMINA_RECOVERY_PERIOD),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Seeder;

    #[test]
    fn unset_config_is_all_zero() {
        let world = Seeder::new().into_world();
        let session = Session::new(&world);
        assert_eq!(session.kami_config(), KamiConfig::default());
        assert_eq!(session.account_config(), AccountConfig::default());
    }

    #[test]
    fn arrays_and_scalars_load() {
        let mut seed = Seeder::new();
        seed.config_array(KAMI_HARV_EFFICACY, &[3, 1000, 500, 250]);
        seed.config_array(KAMI_HARV_STRAIN, &[3, 1500, 3, 1000, 0, 20]);
        seed.config(KAMI_STANDARD_COOLDOWN, 180);
        let world = seed.into_world();
        let session = Session::new(&world);
        let config = session.kami_config();

        assert_eq!(config.harvest_efficacy.base(), 1.0);
        assert_eq!(config.harvest_efficacy.up(), 0.5);
        assert_eq!(config.harvest_efficacy.down(), 0.25);
        assert_eq!(config.strain.ratio.to_f64(), 1.5);
        assert_eq!(config.strain.nudge.to_f64(), 20.0);
        assert_eq!(config.cooldown, 180);
    }
}
