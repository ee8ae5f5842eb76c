//! Mechanism for loading and checking the selection configuration
//!
//! The configuration is a TOML file whose tables mirror the structs below.
//! Any key may be omitted, in which case the built-in default applies, but
//! unknown keys are rejected so that typos do not go unnoticed. Nested tables
//! are merged key by key, so overriding one threshold of one object type
//! keeps every other default of that object type.

use crate::{
    channel::{FhslOptions, SemileptonicOptions},
    error::{Result, SelectionError},
    numeric::Float,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::{debug, info};

/// Selection configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    /// Events come from collision data, so truth information must not be read
    pub is_data: bool,

    /// Number of events processed together
    pub chunk_size: usize,

    /// Options of the semileptonic channel
    pub semileptonic: SemileptonicOptions,

    /// Options of the combined fully hadronic/semileptonic channel
    pub fhsl: FhslOptions,
}
//
impl Default for Configuration {
    fn default() -> Self {
        Self {
            is_data: false,
            chunk_size: 10_000,
            semileptonic: SemileptonicOptions::default(),
            fhsl: FhslOptions::default(),
        }
    }
}
//
impl Configuration {
    /// Load the configuration from a file and check it
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| SelectionError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config = Self::parse(&text, path)?;
        config.print();
        Ok(config)
    }

    /// Build the configuration from TOML text and check it
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Self::parse(text, Path::new("<inline>"))
    }

    /// Check that the configuration makes sense
    ///
    /// The first offending key is reported, using its dotted path.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(SelectionError::config(
                "chunk_size",
                "chunks must hold at least one event",
            ));
        }
        self.semileptonic.validate("semileptonic")?;
        self.fhsl.validate("fhsl")
    }

    /// Log the main settings
    pub fn print(&self) {
        info!(
            is_data = self.is_data,
            chunk_size = self.chunk_size,
            semileptonic_signal = self.semileptonic.gen_info.is_signal,
            fhsl_signal = self.fhsl.gen_info.is_signal,
            "Loaded configuration"
        );
        debug!(config = ?self, "Full configuration");
    }

    fn parse(text: &str, path: &Path) -> Result<Self> {
        let syntax_error = |source| SelectionError::ConfigSyntax {
            path: path.to_owned(),
            source,
        };
        let user: toml::Table = toml::from_str(text).map_err(syntax_error)?;
        let toml::Value::Table(mut merged) = toml::Value::try_from(Self::default())
            .expect("The default configuration is representable in TOML")
        else {
            unreachable!("A struct always serializes into a table")
        };
        merge(&mut merged, user);
        let config: Self = toml::Value::Table(merged)
            .try_into()
            .map_err(syntax_error)?;
        config.validate()?;
        Ok(config)
    }
}

/// Overlay user-provided keys onto the defaults, recursing into tables
///
/// Arrays and scalars are replaced as a whole.
///
fn merge(defaults: &mut toml::Table, user: toml::Table) {
    for (key, value) in user {
        match (defaults.get_mut(&key), value) {
            (Some(toml::Value::Table(base)), toml::Value::Table(overlay)) => merge(base, overlay),
            (_, value) => {
                defaults.insert(key, value);
            }
        }
    }
}

// ### THRESHOLD CHECKS SHARED BY THE OPTION STRUCTS ###

/// The value must be a finite number
pub(crate) fn check_finite(key: &str, value: Float) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SelectionError::config(key, format!("{value} is not finite")))
    }
}

/// The value must be finite and at least zero
pub(crate) fn check_non_negative(key: &str, value: Float) -> Result<()> {
    check_finite(key, value)?;
    if value >= 0. {
        Ok(())
    } else {
        Err(SelectionError::config(key, format!("{value} is negative")))
    }
}

/// The value must be finite and strictly above zero
pub(crate) fn check_positive(key: &str, value: Float) -> Result<()> {
    check_finite(key, value)?;
    if value > 0. {
        Ok(())
    } else {
        Err(SelectionError::config(
            key,
            format!("{value} is not strictly positive"),
        ))
    }
}

/// Fixed-width outputs need at least one slot
pub(crate) fn check_width(key: &str, width: usize) -> Result<()> {
    if width > 0 {
        Ok(())
    } else {
        Err(SelectionError::config(key, "at least one slot is needed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cascade::Comparison, selection::ElectronId};
    use std::io::Write;

    #[test]
    fn empty_file_means_defaults() {
        let config = Configuration::from_toml_str("").unwrap();
        assert_eq!(config, Configuration::default());
        assert_eq!(config.semileptonic.muons.eta, 2.5);
        assert_eq!(config.fhsl.muons.eta, 2.4);
        assert_eq!(config.fhsl.jets.pt, 20.);
    }

    #[test]
    fn overrides_keep_sibling_defaults() {
        let config = Configuration::from_toml_str(
            r#"
            is_data = true

            [semileptonic.electrons]
            pt = 25.0
            id = "WP80"

            [fhsl.gen_info]
            is_Signal = true
            "#,
        )
        .unwrap();
        assert!(config.is_data);
        let electrons = &config.semileptonic.electrons;
        assert_eq!(electrons.pt, 25.);
        assert_eq!(electrons.id, ElectronId::Wp80);
        assert_eq!(electrons.eta, 2.5);
        assert!(electrons.rm_ecal_crack);
        assert_eq!(config.semileptonic.muons.eta, 2.5);
        assert!(config.fhsl.gen_info.is_signal);
        assert!(!config.semileptonic.gen_info.is_signal);
    }

    #[test]
    fn category_lists_are_replaced() {
        let config = Configuration::from_toml_str(
            r#"
            [[fhsl.categories]]
            name = "boosted"
            code = 7
            require = [
                { of = "n_fatjets_H", cmp = "ge", value = 1 },
                { of = "photon_id", cmp = "eq", value = 1 },
            ]
            "#,
        )
        .unwrap();
        let rules = &config.fhsl.categories;
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].code, 7);
        assert_eq!(rules[0].require[0].cmp, Comparison::Ge);
        assert_eq!(config.semileptonic.categories.len(), 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Configuration::from_toml_str("[semileptonic.jets]\nptt = 30.0").unwrap_err();
        assert!(matches!(err, SelectionError::ConfigSyntax { .. }));
        let err = Configuration::from_toml_str("verbose = true").unwrap_err();
        assert!(matches!(err, SelectionError::ConfigSyntax { .. }));
    }

    #[test]
    fn invalid_values_name_their_key() {
        let check = |toml: &str, key: &str| match Configuration::from_toml_str(toml) {
            Err(SelectionError::Configuration { key: k, .. }) => assert_eq!(k, key),
            other => panic!("Expected a configuration error for {key}, got {other:?}"),
        };
        check("chunk_size = 0", "chunk_size");
        check("[fhsl.jets]\neta = 0.0", "fhsl.jets.eta");
        check("[semileptonic.muons]\ndr_photons = -0.4", "semileptonic.muons.dr_photons");
        check("[semileptonic.widths]\nfatjets_W = 0", "semileptonic.widths.fatjets_W");
        check("[fhsl]\ncategories = []", "fhsl.categories");
        check(
            concat!(
                "[[fhsl.categories]]\nname = \"x\"\ncode = 0\n",
                "require = [{ of = \"n_jets\", cmp = \"ge\", value = 4 }]",
            ),
            "fhsl.categories.x",
        );
        check(
            concat!(
                "[[fhsl.categories]]\nname = \"x\"\ncode = 1\n",
                "require = [{ of = \"n_taus\", cmp = \"ge\", value = 1 }]",
            ),
            "fhsl.categories.x",
        );
    }

    #[test]
    fn load_reports_file_problems() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Configuration::load(&missing),
            Err(SelectionError::Io { .. })
        ));

        let path = dir.path().join("selection.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "chunk_size = 500").unwrap();
        drop(file);
        assert_eq!(Configuration::load(&path).unwrap().chunk_size, 500);
    }

    #[test]
    fn thresholds() {
        assert!(check_finite("x", Float::NAN).is_err());
        assert!(check_non_negative("x", 0.).is_ok());
        assert!(check_non_negative("x", -1.).is_err());
        assert!(check_positive("x", 0.).is_err());
        assert!(check_positive("x", Float::INFINITY).is_err());
        assert!(check_width("x", 1).is_ok());
        assert!(check_width("x", 0).is_err());
    }
}
