//! CEF line formatting
//!
//! ```text
//! CEF:0|Vendor|Product|Version|SignatureID|Name|Severity|Extension
//! ```
//!
//! Header fields escape `\` and `|`; extension values escape `\` and `=`
//! and encode line breaks as `\n`.

use logwarden_core::config::CefConfig;
use logwarden_core::domain::DeviceEvent;

/// Render one event as a CEF line using the configured header
pub fn format_cef(header: &CefConfig, event: &DeviceEvent) -> String {
    let subject = escape_extension(event.subject());
    let code = event.code().code();

    format!(
        "CEF:0|{}|{}|{}|{}|{}|{}|msg={subject} {code} cs1Label=Device Name cs1={subject} cs2Label=Event Number cs2={code}",
        escape_header(&header.vendor),
        escape_header(&header.product),
        escape_header(&header.version),
        escape_header(&header.signature_id),
        escape_header(&header.name),
        header.severity,
    )
}

fn escape_header(value: &str) -> String {
    value.replace('\\', "\\\\").replace('|', "\\|")
}

fn escape_extension(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '=' => out.push_str("\\="),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use logwarden_core::domain::{DeviceName, EventCode};

    fn header() -> CefConfig {
        CefConfig {
            vendor: "Acme Infosec".to_string(),
            product: "logwarden".to_string(),
            version: "1.0".to_string(),
            signature_id: "0".to_string(),
            name: "Asset-Logging-Status".to_string(),
            severity: 3,
        }
    }

    #[test]
    fn test_device_event_line() {
        let device: DeviceName = "site-a/fw01".parse().unwrap();
        let line = format_cef(&header(), &DeviceEvent::new(&device, EventCode::NewlyOverdue));

        assert_eq!(
            line,
            "CEF:0|Acme Infosec|logwarden|1.0|0|Asset-Logging-Status|3|\
             msg=site-a/fw01 3 cs1Label=Device Name cs1=site-a/fw01 \
             cs2Label=Event Number cs2=3"
        );
    }

    #[test]
    fn test_operational_error_line() {
        let line = format_cef(&header(), &DeviceEvent::operational_error("Query Error"));
        assert!(line.ends_with("msg=Query Error 100 cs1Label=Device Name cs1=Query Error cs2Label=Event Number cs2=100"));
    }

    #[test]
    fn test_header_escaping() {
        let mut h = header();
        h.vendor = r"Acme|Sec\Ops".to_string();
        let line = format_cef(&h, &DeviceEvent::operational_error("x"));
        assert!(line.starts_with(r"CEF:0|Acme\|Sec\\Ops|logwarden|"));
    }

    #[test]
    fn test_extension_escaping() {
        let line = format_cef(&header(), &DeviceEvent::operational_error("a=b\nc"));
        assert!(line.contains(r"msg=a\=b\nc 100"));
    }
}
