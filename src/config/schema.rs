use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scoring::Catalog;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Family catalog; the built-in NIST SP 800-53 catalog when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<Catalog>,

    /// Where the assessment session is kept (defaults to ~/.config/control-score/session.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_path: Option<PathBuf>,
}

impl Config {
    pub fn effective_catalog(&self) -> Catalog {
        self.catalog.clone().unwrap_or_default()
    }

    /// Total weight of a user-supplied catalog whose weights do not sum to 1.0.
    ///
    /// The built-in catalog sums to 1.14 on purpose and is never reported.
    pub fn unnormalized_weight(&self) -> Option<Decimal> {
        let total = self.catalog.as_ref()?.total_weight();
        (total != Decimal::ONE).then_some(total)
    }

    /// Session file from the config, or the default under the config dir.
    pub fn effective_session_path(&self) -> PathBuf {
        self.session_path
            .clone()
            .unwrap_or_else(crate::session::get_session_path)
    }
}
