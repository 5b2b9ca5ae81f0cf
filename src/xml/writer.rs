use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Cursor;

use crate::core::FiscalError;

pub type XmlResult = Result<String, FiscalError>;

fn xml_io(e: std::io::Error) -> FiscalError {
    FiscalError::Xml(format!("XML write error: {e}"))
}

/// Compact XML writer.
///
/// No declaration, no indentation, no self-closing tags: the output feeds
/// the enveloped signature, so it must already be in canonical-compatible
/// form (byte-stable, attribute order as written, quick-xml escaping).
pub struct XmlWriter {
    writer: Writer<Cursor<Vec<u8>>>,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(Cursor::new(Vec::new())),
        }
    }

    pub fn into_string(self) -> XmlResult {
        let buf = self.writer.into_inner().into_inner();
        String::from_utf8(buf).map_err(|e| FiscalError::Xml(format!("XML UTF-8 error: {e}")))
    }

    pub fn start_element(&mut self, name: &str) -> Result<&mut Self, FiscalError> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn start_element_with_attrs(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
    ) -> Result<&mut Self, FiscalError> {
        let mut elem = BytesStart::new(name);
        for (k, v) in attrs {
            elem.push_attribute((*k, *v));
        }
        self.writer
            .write_event(Event::Start(elem))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn end_element(&mut self, name: &str) -> Result<&mut Self, FiscalError> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(xml_io)?;
        Ok(self)
    }

    pub fn text_element(&mut self, name: &str, text: &str) -> Result<&mut Self, FiscalError> {
        self.start_element(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_io)?;
        self.end_element(name)
    }

    /// Text element emitted only when `text` is non-empty.
    pub fn opt_text_element(
        &mut self,
        name: &str,
        text: &str,
    ) -> Result<&mut Self, FiscalError> {
        if text.is_empty() {
            Ok(self)
        } else {
            self.text_element(name, text)
        }
    }

    /// Monetary value: fixed 2 decimal places.
    pub fn amount_element(&mut self, name: &str, amount: Decimal) -> Result<&mut Self, FiscalError> {
        self.text_element(name, &format_amount(amount))
    }

    /// Quantity or unit price: fixed 4 decimal places.
    pub fn quantity_element(&mut self, name: &str, qty: Decimal) -> Result<&mut Self, FiscalError> {
        self.text_element(name, &format_quantity(qty))
    }
}

impl Default for XmlWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a Decimal with exactly `places` decimal digits, half-up rounding.
pub fn format_fixed(d: Decimal, places: usize) -> String {
    let rounded = d.round_dp_with_strategy(places as u32, RoundingStrategy::MidpointAwayFromZero);
    let s = rounded.to_string();
    match s.find('.') {
        Some(dot) => {
            let have = s.len() - dot - 1;
            if have < places {
                format!("{s}{}", "0".repeat(places - have))
            } else {
                s
            }
        }
        None => format!("{s}.{}", "0".repeat(places)),
    }
}

/// Monetary formatting: fixed 2 decimal places (`vProd`, `vNF`, `vPag`, …).
pub fn format_amount(d: Decimal) -> String {
    format_fixed(d, 2)
}

/// Quantity/unit-price formatting: fixed 4 decimal places (`qCom`, `vUnCom`).
pub fn format_quantity(d: Decimal) -> String {
    format_fixed(d, 4)
}

/// Clamp a string to the schema's declared maximum length. Over-long input
/// is truncated, never rejected.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_formatting() {
        assert_eq!(format_amount(dec!(10)), "10.00");
        assert_eq!(format_amount(dec!(10.5)), "10.50");
        assert_eq!(format_amount(dec!(10.005)), "10.01");
        assert_eq!(format_amount(dec!(0)), "0.00");
        assert_eq!(format_amount(dec!(1234.567)), "1234.57");
    }

    #[test]
    fn quantity_formatting() {
        assert_eq!(format_quantity(dec!(1)), "1.0000");
        assert_eq!(format_quantity(dec!(2.5)), "2.5000");
        assert_eq!(format_quantity(dec!(0.12345)), "0.1235");
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc");
        // Truncation respects char boundaries, not bytes.
        assert_eq!(truncate("çãéíó", 3), "çãé");
    }

    #[test]
    fn writer_is_compact() {
        let mut w = XmlWriter::new();
        w.start_element("a").unwrap();
        w.text_element("b", "x & y").unwrap();
        w.end_element("a").unwrap();
        assert_eq!(w.into_string().unwrap(), "<a><b>x &amp; y</b></a>");
    }
}
