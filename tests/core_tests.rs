use chrono::{DateTime, FixedOffset, TimeZone};
use notafiscal::core::*;
use rust_decimal_macros::dec;

fn issued(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
    FixedOffset::west_opt(3 * 3600)
        .unwrap()
        .with_ymd_and_hms(y, m, d, 10, 30, 0)
        .unwrap()
}

fn issuer() -> Issuer {
    IssuerBuilder::new(
        "11222333000181",
        "LOJA EXEMPLO LTDA",
        AddressBuilder::new("Sao Paulo", "3550308", Uf::Sp)
            .street("Rua das Flores", "100")
            .district("Centro")
            .postal_code("01001000")
            .build(),
    )
    .trade_name("Loja Exemplo")
    .state_registration("123456789012")
    .tax_regime(TaxRegime::Simplified)
    .build()
}

fn buyer() -> Recipient {
    RecipientBuilder::new("99888777000166", "CLIENTE EXEMPLO SA")
        .address(
            AddressBuilder::new("Campinas", "3509502", Uf::Sp)
                .street("Av. Brasil", "200")
                .district("Cambui")
                .postal_code("13010000")
                .build(),
        )
        .build()
}

fn tech_responsible() -> TechResponsible {
    TechResponsible {
        cnpj: "11222333000181".into(),
        contact: "Suporte".into(),
        email: "suporte@exemplo.com.br".into(),
        phone: "1133334444".into(),
    }
}

fn sample_line() -> DocumentLine {
    DocumentLineBuilder::new("SKU001", "PRODUTO TESTE", dec!(1), dec!(10.00))
        .ncm("61091000")
        .cfop("5102")
        .unit("UN")
        .build()
}

// --- Invoice builder ---

#[test]
fn invoice_builds_with_full_input() {
    let doc = InvoiceBuilder::new(issuer(), Environment::Staging)
        .series(1)
        .number(1)
        .issued_at(issued(2026, 3, 15))
        .nonce(12_345_678)
        .recipient(buyer())
        .tech_responsible(tech_responsible())
        .add_line(sample_line())
        .add_payment(Payment::new(PaymentMethod::Cash, dec!(10.00)))
        .build()
        .unwrap();

    assert_eq!(doc.model(), Model::Invoice);
    let info = doc.info();
    assert_eq!(info.access_key.as_str().len(), 44);
    assert_eq!(info.access_key.uf(), Some(Uf::Sp));
    assert_eq!(info.total(), dec!(10.00));
    assert_eq!(doc.signature_reference(), format!("NFe{}", info.access_key.as_str()));
}

#[test]
fn invoice_requires_recipient() {
    let err = InvoiceBuilder::new(issuer(), Environment::Staging)
        .number(1)
        .tech_responsible(tech_responsible())
        .add_line(sample_line())
        .build()
        .unwrap_err();
    assert!(matches!(err, FiscalError::Validation(_)));
}

#[test]
fn validation_errors_carry_field_paths() {
    let err = InvoiceBuilder::new(issuer(), Environment::Staging)
        .number(1)
        .tech_responsible(tech_responsible())
        .add_line(sample_line())
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("recipient"), "{err}");

    let detail = ValidationError::new("issuer.cnpj", "tax id is required");
    assert_eq!(detail.to_string(), "issuer.cnpj: tax id is required");
    assert_eq!(
        FiscalError::from(detail).to_string(),
        "validation failed: issuer.cnpj: tax id is required"
    );
}

#[test]
fn invoice_requires_lines() {
    let err = InvoiceBuilder::new(issuer(), Environment::Staging)
        .number(1)
        .recipient(buyer())
        .tech_responsible(tech_responsible())
        .build()
        .unwrap_err();
    assert!(matches!(err, FiscalError::Validation(_)));
}

#[test]
fn invoice_requires_number() {
    let err = InvoiceBuilder::new(issuer(), Environment::Staging)
        .recipient(buyer())
        .tech_responsible(tech_responsible())
        .add_line(sample_line())
        .build()
        .unwrap_err();
    assert!(matches!(err, FiscalError::Validation(_)));
}

#[test]
fn invoice_rejects_series_zero() {
    let err = InvoiceBuilder::new(issuer(), Environment::Staging)
        .series(0)
        .number(1)
        .recipient(buyer())
        .tech_responsible(tech_responsible())
        .add_line(sample_line())
        .build()
        .unwrap_err();
    assert!(matches!(err, FiscalError::Validation(_)));
}

// --- Receipt builder ---

#[test]
fn receipt_builds_without_recipient() {
    let doc = ReceiptBuilder::new(issuer(), Environment::Staging)
        .number(42)
        .issued_at(issued(2026, 3, 15))
        .add_line(sample_line())
        .add_payment(Payment::new(PaymentMethod::Pix, dec!(10.00)))
        .build()
        .unwrap();

    assert_eq!(doc.model(), Model::Receipt);
    assert_eq!(doc.info().number, 42);
}

#[test]
fn receipt_accepts_qr_code_invoice_does_not() {
    let mut receipt = ReceiptBuilder::new(issuer(), Environment::Staging)
        .number(1)
        .add_line(sample_line())
        .build()
        .unwrap();
    receipt
        .set_qr_code("https://example/qr?p=...", "https://example/consulta")
        .unwrap();

    let mut invoice = InvoiceBuilder::new(issuer(), Environment::Staging)
        .number(1)
        .recipient(buyer())
        .tech_responsible(tech_responsible())
        .add_line(sample_line())
        .build()
        .unwrap();
    assert!(invoice.set_qr_code("x", "y").is_err());
}

// --- Access key ---

#[test]
fn access_key_layout_matches_inputs() {
    let at = issued(2026, 3, 15);
    let key = AccessKey::generate(
        Uf::Sp,
        &at,
        "11222333000181",
        Model::Invoice,
        1,
        987,
        EmissionType::Normal,
        12_345_678,
    )
    .unwrap();

    let s = key.as_str();
    assert_eq!(&s[0..2], "35"); // Sao Paulo
    assert_eq!(&s[2..6], "2603"); // YYMM
    assert_eq!(&s[6..20], "11222333000181");
    assert_eq!(&s[20..22], "55");
    assert_eq!(&s[22..25], "001");
    assert_eq!(&s[25..34], "000000987");
    assert_eq!(&s[34..35], "1");
    assert_eq!(&s[35..43], "12345678");

    // The whole key re-validates.
    let parsed = AccessKey::parse(s).unwrap();
    assert_eq!(parsed.as_str(), s);
}

#[test]
fn access_key_rejects_bad_cnpj() {
    let at = issued(2026, 3, 15);
    let err = AccessKey::generate(
        Uf::Sp,
        &at,
        "123",
        Model::Invoice,
        1,
        1,
        EmissionType::Normal,
        0,
    )
    .unwrap_err();
    assert!(matches!(err, FiscalError::Validation(_)));
}

#[test]
fn access_key_parse_rejects_corrupted_digit() {
    let at = issued(2026, 3, 15);
    let key = AccessKey::generate(
        Uf::Sp,
        &at,
        "11222333000181",
        Model::Receipt,
        3,
        555,
        EmissionType::Normal,
        42,
    )
    .unwrap();

    let mut bytes = key.as_str().as_bytes().to_vec();
    bytes[10] = if bytes[10] == b'9' { b'0' } else { bytes[10] + 1 };
    let corrupted = String::from_utf8(bytes).unwrap();
    assert!(AccessKey::parse(&corrupted).is_err());
}

// --- Sequencing against total flow ---

#[test]
fn sequencer_feeds_builder_numbers() {
    let sequencer = NumberSequencer::new(MemorySequenceStore::new());
    let first = sequencer.next("11222333000181", 1).unwrap();
    assert_eq!(first, 1);

    let doc = ReceiptBuilder::new(issuer(), Environment::Staging)
        .number(first)
        .add_line(sample_line())
        .build()
        .unwrap();
    assert_eq!(doc.info().number, 1);

    assert_eq!(sequencer.next("11222333000181", 1).unwrap(), 2);
    // Other series are untouched.
    assert_eq!(sequencer.next("11222333000181", 2).unwrap(), 1);
}

#[test]
fn line_total_defaults_to_quantity_times_price() {
    let line = DocumentLineBuilder::new("A", "AGUA", dec!(3), dec!(2.50)).build();
    assert_eq!(line.total, dec!(7.50));

    let line = DocumentLineBuilder::new("B", "CAFE", dec!(2), dec!(5.00))
        .total(dec!(9.00))
        .build();
    assert_eq!(line.total, dec!(9.00));
}
