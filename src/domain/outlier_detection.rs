//! Passive health checking configuration.

use serde::{Deserialize, Serialize};

use crate::validation::{check_non_negative, check_percentage, check_positive, Validation, ValidationError};

/// Outlier detection ejects instances that behave unlike their peers from
/// the load balancing set. Unset fields take the proxy's defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutlierDetection {
    /// Time between ejection sweeps; must be positive (default 10s)
    #[serde(default)]
    pub interval_msec: Option<i32>,

    /// Base ejection time, multiplied by the number of ejections (default 30s)
    #[serde(default)]
    pub base_ejection_time_msec: Option<i32>,

    /// Maximum percentage of the cluster that may be ejected (default 10)
    #[serde(default)]
    pub max_ejection_percent: Option<i32>,

    /// Consecutive 5xx responses before ejection (default 5, 0 disables)
    #[serde(default)]
    pub consecutive_5xx: Option<i32>,

    /// Percent chance of ejecting on consecutive 5xx (default 100)
    #[serde(default)]
    pub enforcing_consecutive_5xx: Option<i32>,

    /// Percent chance of ejecting on success rate statistics (default 100)
    #[serde(default)]
    pub enforcing_success_rate: Option<i32>,

    /// Hosts with enough volume required for success rate detection (default 5)
    #[serde(default)]
    pub success_rate_minimum_hosts: Option<i32>,

    /// Requests per interval for a host to count toward success rate
    /// detection; must be positive (default 100)
    #[serde(default)]
    pub success_rate_request_volume: Option<i32>,

    /// Standard deviation factor times 1000 (default 1900)
    #[serde(default)]
    pub success_rate_stdev_factor: Option<i32>,

    /// Consecutive gateway failures before ejection (default 5)
    #[serde(default)]
    pub consecutive_gateway_failure: Option<i32>,

    /// Percent chance of ejecting on consecutive gateway failures (default 0)
    #[serde(default)]
    pub enforcing_consecutive_gateway_failure: Option<i32>,
}

impl OutlierDetection {
    pub fn equals(&self, other: &OutlierDetection) -> bool {
        self == other
    }

    pub fn is_valid(&self) -> Validation {
        let mut errs = ValidationError::new();

        // A zero interval would spin the ejection sweep.
        check_positive(self.interval_msec, &mut errs, "interval_msec");
        check_non_negative(self.base_ejection_time_msec, &mut errs, "base_ejection_time_msec");
        check_percentage(self.max_ejection_percent, &mut errs, "max_ejection_percent");
        check_non_negative(self.consecutive_5xx, &mut errs, "consecutive_5xx");
        check_percentage(self.enforcing_consecutive_5xx, &mut errs, "enforcing_consecutive_5xx");
        check_percentage(self.enforcing_success_rate, &mut errs, "enforcing_success_rate");
        check_non_negative(
            self.success_rate_minimum_hosts,
            &mut errs,
            "success_rate_minimum_hosts",
        );
        check_positive(
            self.success_rate_request_volume,
            &mut errs,
            "success_rate_request_volume",
        );
        check_non_negative(self.success_rate_stdev_factor, &mut errs, "success_rate_stdev_factor");
        check_non_negative(
            self.consecutive_gateway_failure,
            &mut errs,
            "consecutive_gateway_failure",
        );
        check_percentage(
            self.enforcing_consecutive_gateway_failure,
            &mut errs,
            "enforcing_consecutive_gateway_failure",
        );

        errs.or_nil()
    }
}
