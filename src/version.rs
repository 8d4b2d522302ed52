//! Version information

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn format_version_info() -> String {
    format!("chirp v{}", CURRENT_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_info_names_the_binary() {
        assert!(format_version_info().starts_with("chirp v"));
        assert!(format_version_info().ends_with(CURRENT_VERSION));
    }
}
