use chrono::{DateTime, FixedOffset, Utc};
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};

use super::access_key::AccessKey;
use super::error::{FiscalError, ValidationError};
use super::types::*;
use super::uf::Uf;

/// Builder for [`Issuer`].
pub struct IssuerBuilder {
    cnpj: String,
    legal_name: String,
    trade_name: Option<String>,
    address: Address,
    state_registration: String,
    tax_regime: TaxRegime,
}

impl IssuerBuilder {
    pub fn new(cnpj: impl Into<String>, legal_name: impl Into<String>, address: Address) -> Self {
        Self {
            cnpj: cnpj.into(),
            legal_name: legal_name.into(),
            trade_name: None,
            address,
            state_registration: String::new(),
            tax_regime: TaxRegime::Simplified,
        }
    }

    pub fn trade_name(mut self, name: impl Into<String>) -> Self {
        self.trade_name = Some(name.into());
        self
    }

    pub fn state_registration(mut self, ie: impl Into<String>) -> Self {
        self.state_registration = ie.into();
        self
    }

    pub fn tax_regime(mut self, regime: TaxRegime) -> Self {
        self.tax_regime = regime;
        self
    }

    pub fn build(self) -> Issuer {
        Issuer {
            cnpj: self.cnpj,
            legal_name: self.legal_name,
            trade_name: self.trade_name,
            address: self.address,
            state_registration: self.state_registration,
            tax_regime: self.tax_regime,
        }
    }
}

/// Builder for [`Address`].
pub struct AddressBuilder {
    street: String,
    number: String,
    district: String,
    city_code: String,
    city_name: String,
    uf: Uf,
    postal_code: String,
}

impl AddressBuilder {
    pub fn new(city_name: impl Into<String>, city_code: impl Into<String>, uf: Uf) -> Self {
        Self {
            street: String::new(),
            number: "S/N".into(),
            district: String::new(),
            city_code: city_code.into(),
            city_name: city_name.into(),
            uf,
            postal_code: String::new(),
        }
    }

    pub fn street(mut self, street: impl Into<String>, number: impl Into<String>) -> Self {
        self.street = street.into();
        self.number = number.into();
        self
    }

    pub fn district(mut self, district: impl Into<String>) -> Self {
        self.district = district.into();
        self
    }

    pub fn postal_code(mut self, cep: impl Into<String>) -> Self {
        self.postal_code = cep.into();
        self
    }

    pub fn build(self) -> Address {
        Address {
            street: self.street,
            number: self.number,
            district: self.district,
            city_code: self.city_code,
            city_name: self.city_name,
            uf: self.uf,
            postal_code: self.postal_code,
        }
    }
}

/// Builder for [`Recipient`].
pub struct RecipientBuilder {
    tax_id: String,
    name: String,
    address: Option<Address>,
}

impl RecipientBuilder {
    pub fn new(tax_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tax_id: tax_id.into(),
            name: name.into(),
            address: None,
        }
    }

    pub fn address(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn build(self) -> Recipient {
        Recipient {
            tax_id: self.tax_id,
            name: self.name,
            address: self.address,
        }
    }
}

/// Builder for [`DocumentLine`]. The line total defaults to
/// quantity × unit price rounded to 2 decimal places.
pub struct DocumentLineBuilder {
    product_code: String,
    description: String,
    ncm: String,
    cfop: String,
    unit: String,
    quantity: Decimal,
    unit_price: Decimal,
    total: Option<Decimal>,
}

impl DocumentLineBuilder {
    pub fn new(
        product_code: impl Into<String>,
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Self {
        Self {
            product_code: product_code.into(),
            description: description.into(),
            ncm: "00000000".into(),
            cfop: "5102".into(),
            unit: "UN".into(),
            quantity,
            unit_price,
            total: None,
        }
    }

    pub fn ncm(mut self, ncm: impl Into<String>) -> Self {
        self.ncm = ncm.into();
        self
    }

    pub fn cfop(mut self, cfop: impl Into<String>) -> Self {
        self.cfop = cfop.into();
        self
    }

    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn total(mut self, total: Decimal) -> Self {
        self.total = Some(total);
        self
    }

    pub fn build(self) -> DocumentLine {
        let total = self.total.unwrap_or_else(|| {
            (self.quantity * self.unit_price)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        });
        DocumentLine {
            product_code: self.product_code,
            description: self.description,
            ncm: self.ncm,
            cfop: self.cfop,
            unit: self.unit,
            quantity: self.quantity,
            unit_price: self.unit_price,
            total,
        }
    }
}

// Shared plumbing for the two document builders.
struct InfoBuilder {
    issuer: Issuer,
    environment: Environment,
    series: u16,
    number: Option<u64>,
    issued_at: Option<DateTime<FixedOffset>>,
    nonce: Option<u32>,
    operation_nature: String,
    lines: Vec<DocumentLine>,
    payments: Vec<Payment>,
    additional_info: Option<String>,
}

impl InfoBuilder {
    fn new(issuer: Issuer, environment: Environment) -> Self {
        Self {
            issuer,
            environment,
            series: 1,
            number: None,
            issued_at: None,
            nonce: None,
            operation_nature: "VENDA".into(),
            lines: Vec::new(),
            payments: Vec::new(),
            additional_info: None,
        }
    }

    fn build(self, model: Model) -> Result<DocumentInfo, FiscalError> {
        if self.issuer.cnpj.is_empty() {
            return Err(ValidationError::new("issuer.cnpj", "tax id is required").into());
        }
        if self.lines.is_empty() {
            return Err(ValidationError::new("lines", "at least one document line is required").into());
        }
        if self.series == 0 {
            return Err(ValidationError::new("series", "must be >= 1").into());
        }
        let number = self
            .number
            .ok_or_else(|| ValidationError::new("number", "document number is required"))?;

        let uf = self.issuer.address.uf;
        let issued_at = self
            .issued_at
            .unwrap_or_else(|| Utc::now().with_timezone(&uf.utc_offset()));
        let nonce = self
            .nonce
            .unwrap_or_else(|| rand::thread_rng().gen_range(0..100_000_000));

        let access_key = AccessKey::generate(
            uf,
            &issued_at,
            &self.issuer.cnpj,
            model,
            self.series,
            number,
            EmissionType::Normal,
            nonce,
        )?;

        Ok(DocumentInfo {
            issuer: self.issuer,
            environment: self.environment,
            series: self.series,
            number,
            issued_at,
            nonce,
            access_key,
            operation_nature: self.operation_nature,
            lines: self.lines,
            payments: self.payments,
            additional_info: self.additional_info,
        })
    }
}

/// Builder for NF-e (model 55) documents.
pub struct InvoiceBuilder {
    info: InfoBuilder,
    recipient: Option<Recipient>,
    tech_responsible: Option<TechResponsible>,
}

impl InvoiceBuilder {
    pub fn new(issuer: Issuer, environment: Environment) -> Self {
        Self {
            info: InfoBuilder::new(issuer, environment),
            recipient: None,
            tech_responsible: None,
        }
    }

    pub fn series(mut self, series: u16) -> Self {
        self.info.series = series;
        self
    }

    pub fn number(mut self, number: u64) -> Self {
        self.info.number = Some(number);
        self
    }

    pub fn issued_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.info.issued_at = Some(at);
        self
    }

    /// Fix the 8-digit numeric nonce (`cNF`). Random when unset.
    pub fn nonce(mut self, nonce: u32) -> Self {
        self.info.nonce = Some(nonce);
        self
    }

    pub fn operation_nature(mut self, nat: impl Into<String>) -> Self {
        self.info.operation_nature = nat.into();
        self
    }

    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn tech_responsible(mut self, resp: TechResponsible) -> Self {
        self.tech_responsible = Some(resp);
        self
    }

    pub fn add_line(mut self, line: DocumentLine) -> Self {
        self.info.lines.push(line);
        self
    }

    pub fn add_payment(mut self, payment: Payment) -> Self {
        self.info.payments.push(payment);
        self
    }

    pub fn additional_info(mut self, info: impl Into<String>) -> Self {
        self.info.additional_info = Some(info.into());
        self
    }

    /// Build the invoice, deriving the access key. Fails fast on missing
    /// issuer tax id, empty lines, or a missing recipient/responsible block.
    pub fn build(self) -> Result<FiscalDocument, FiscalError> {
        let recipient = self
            .recipient
            .ok_or_else(|| ValidationError::new("recipient", "invoice recipient is required"))?;
        if recipient.address.is_none() {
            return Err(ValidationError::new("recipient.address", "required on invoices").into());
        }
        let tech_responsible = self.tech_responsible.ok_or_else(|| {
            ValidationError::new("tech_responsible", "responsible block is required on invoices")
        })?;
        let info = self.info.build(Model::Invoice)?;
        Ok(FiscalDocument::Invoice(Invoice {
            info,
            recipient,
            tech_responsible,
        }))
    }
}

/// Builder for NFC-e (model 65) documents.
pub struct ReceiptBuilder {
    info: InfoBuilder,
    recipient: Option<Recipient>,
}

impl ReceiptBuilder {
    pub fn new(issuer: Issuer, environment: Environment) -> Self {
        Self {
            info: InfoBuilder::new(issuer, environment),
            recipient: None,
        }
    }

    pub fn series(mut self, series: u16) -> Self {
        self.info.series = series;
        self
    }

    pub fn number(mut self, number: u64) -> Self {
        self.info.number = Some(number);
        self
    }

    pub fn issued_at(mut self, at: DateTime<FixedOffset>) -> Self {
        self.info.issued_at = Some(at);
        self
    }

    pub fn nonce(mut self, nonce: u32) -> Self {
        self.info.nonce = Some(nonce);
        self
    }

    pub fn operation_nature(mut self, nat: impl Into<String>) -> Self {
        self.info.operation_nature = nat.into();
        self
    }

    /// Identify the consumer (tax id + name only; the address block is never
    /// emitted for receipts).
    pub fn recipient(mut self, recipient: Recipient) -> Self {
        self.recipient = Some(recipient);
        self
    }

    pub fn add_line(mut self, line: DocumentLine) -> Self {
        self.info.lines.push(line);
        self
    }

    pub fn add_payment(mut self, payment: Payment) -> Self {
        self.info.payments.push(payment);
        self
    }

    pub fn additional_info(mut self, info: impl Into<String>) -> Self {
        self.info.additional_info = Some(info.into());
        self
    }

    pub fn build(self) -> Result<FiscalDocument, FiscalError> {
        let info = self.info.build(Model::Receipt)?;
        Ok(FiscalDocument::Receipt(Receipt {
            info,
            recipient: self.recipient,
            qr_code: None,
            consultation_url: None,
        }))
    }
}
