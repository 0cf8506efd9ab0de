//! OGC service exception reports.

use wms_common::WmsError;

/// Escape text destined for an XML element. Exception messages echo request
/// parameters, which may contain markup characters.
pub fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Generate WMS 1.3.0 exception XML.
pub fn wms_exception(code: &str, message: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ServiceExceptionReport version="1.3.0" xmlns="http://www.opengis.net/ogc">
  <ServiceException code="{}">{}</ServiceException>
</ServiceExceptionReport>"#,
        code,
        xml_escape(message)
    )
}

/// Exception XML for a service error, using its OGC exception code.
pub fn exception_for(error: &WmsError) -> String {
    wms_exception(error.wms_exception_code(), &error.to_string())
}
