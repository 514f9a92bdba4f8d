use log::debug;
use regex::Regex;

/// Best-effort display name from a raw From header
///
/// Expected formats:
/// - `"Jane Doe" <jane@x.com>` → `Jane Doe`
/// - `Jane Doe <jane@x.com>` → `Jane Doe`
/// - `jane@x.com` → unchanged
pub fn extract_sender_name(from: &str) -> String {
    // Quoted display name first
    if let Ok(re) = Regex::new(r#"^"([^"]+)""#) {
        if let Some(name) = re.captures(from).and_then(|caps| caps.get(1)) {
            return name.as_str().to_string();
        }
    }

    // Unquoted name before the angle bracket
    if let Ok(re) = Regex::new(r"(.*?)\s*<") {
        if let Some(name) = re.captures(from).and_then(|caps| caps.get(1)) {
            let name = name.as_str().trim();
            if !name.is_empty() {
                return name.to_string();
            }
        }
    }

    debug!("No display name in From header, using it as is: {}", from);
    from.to_string()
}
