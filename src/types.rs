use encoding_rs::Encoding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Salesforce login hosts accepted for the interactive web login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LoginUrl {
    #[value(name = "https://login.salesforce.com")]
    Production,
    #[value(name = "https://test.salesforce.com")]
    Sandbox,
}

impl LoginUrl {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginUrl::Production => "https://login.salesforce.com",
            LoginUrl::Sandbox => "https://test.salesforce.com",
        }
    }
}

/// Text encoding of the SiteTracker input CSV, resolved from a codec label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEncoding {
    /// UTF-8 with an optional byte-order mark (Excel exports).
    Utf8Sig,
    Codec(&'static Encoding),
}

impl InputEncoding {
    /// Resolve a label such as `utf-8-sig`, `cp1252`, `latin-1` or `utf-16`.
    /// Underscores and a missing hyphen (`latin-1` vs `latin1`) are tolerated.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        if normalized == "utf-8-sig" || normalized == "utf8-sig" {
            return Some(Self::Utf8Sig);
        }
        [label.trim().to_string(), normalized.replace('-', ""), normalized]
            .iter()
            .find_map(|l| Encoding::for_label_no_replacement(l.as_bytes()))
            .map(Self::Codec)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8Sig => "utf-8-sig",
            Self::Codec(codec) => codec.name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;

    #[test]
    fn test_login_url_value_names_match_hosts() {
        for variant in LoginUrl::value_variants() {
            let pv = variant.to_possible_value().unwrap();
            assert_eq!(pv.get_name(), variant.as_str());
        }
    }

    #[test]
    fn test_encoding_labels() {
        assert_eq!(InputEncoding::from_label("utf-8-sig"), Some(InputEncoding::Utf8Sig));
        assert_eq!(InputEncoding::from_label("UTF_8_SIG"), Some(InputEncoding::Utf8Sig));
        assert_eq!(
            InputEncoding::from_label("utf-8"),
            Some(InputEncoding::Codec(encoding_rs::UTF_8))
        );
        assert_eq!(
            InputEncoding::from_label("cp1252"),
            Some(InputEncoding::Codec(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            InputEncoding::from_label("latin-1"),
            Some(InputEncoding::Codec(encoding_rs::WINDOWS_1252))
        );
        assert_eq!(
            InputEncoding::from_label("utf-16"),
            Some(InputEncoding::Codec(encoding_rs::UTF_16LE))
        );
        assert_eq!(
            InputEncoding::from_label("Shift_JIS"),
            Some(InputEncoding::Codec(encoding_rs::SHIFT_JIS))
        );
        assert_eq!(InputEncoding::from_label("not-a-codec"), None);
    }

    #[test]
    fn test_encoding_name() {
        assert_eq!(InputEncoding::Utf8Sig.name(), "utf-8-sig");
        assert_eq!(InputEncoding::Codec(encoding_rs::UTF_16LE).name(), "UTF-16LE");
    }
}
