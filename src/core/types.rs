use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::access_key::AccessKey;
use super::error::FiscalError;
use super::uf::Uf;

/// Emission environment (`tpAmb`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// 1 — Produção: documents have fiscal value.
    Production,
    /// 2 — Homologação: test transactions, no fiscal value.
    Staging,
}

impl Environment {
    pub fn code(&self) -> u8 {
        match self {
            Self::Production => 1,
            Self::Staging => 2,
        }
    }
}

/// Issuer tax regime (`CRT`) — selects the ICMS sub-block emitted per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxRegime {
    /// 1 — Simples Nacional: classification-code (CSOSN) sub-block.
    Simplified,
    /// 3 — Regime Normal: full rate/base (CST) sub-block.
    Standard,
}

impl TaxRegime {
    pub fn code(&self) -> u8 {
        match self {
            Self::Simplified => 1,
            Self::Standard => 3,
        }
    }
}

/// Fiscal document model (`mod`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Model {
    /// 55 — NF-e, full trade invoice.
    Invoice,
    /// 65 — NFC-e, consumer receipt.
    Receipt,
}

impl Model {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "55",
            Self::Receipt => "65",
        }
    }
}

/// Emission type (`tpEmis`). Only synchronous online emission is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionType {
    /// 1 — Normal online emission.
    Normal,
}

impl EmissionType {
    pub fn code(&self) -> u8 {
        match self {
            Self::Normal => 1,
        }
    }
}

/// Postal address (`enderEmit` / `enderDest`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    /// `xLgr`: street name.
    pub street: String,
    /// `nro`: street number.
    pub number: String,
    /// `xBairro`: district.
    pub district: String,
    /// `cMun`: seven-digit IBGE municipality code.
    pub city_code: String,
    /// `xMun`: municipality name.
    pub city_name: String,
    /// `UF`: federative unit.
    pub uf: Uf,
    /// `CEP`: eight-digit postal code.
    pub postal_code: String,
}

/// Document issuer (`emit`). Immutable per request; supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issuer {
    /// `CNPJ`: 14-digit tax id.
    pub cnpj: String,
    /// `xNome`: legal name.
    pub legal_name: String,
    /// `xFant`: trade name.
    pub trade_name: Option<String>,
    /// `enderEmit`: address.
    pub address: Address,
    /// `IE`: state registration.
    pub state_registration: String,
    /// `CRT`: tax regime code.
    pub tax_regime: TaxRegime,
}

/// Document recipient (`dest`). Invoices require the address block;
/// receipts carry at most the tax id and name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// `CNPJ` (14 digits) or `CPF` (11 digits), distinguished by length.
    pub tax_id: String,
    /// `xNome`: name. Replaced by the homologation placeholder in staging.
    pub name: String,
    /// `enderDest`: address (invoice only).
    pub address: Option<Address>,
}

/// One document line (`det`). A document holds an ordered, non-empty
/// sequence of lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentLine {
    /// `cProd`: product code.
    pub product_code: String,
    /// `xProd`: description (max 120 chars in the schema; longer input is
    /// truncated at assembly, not rejected).
    pub description: String,
    /// `NCM`: eight-digit tax classification code.
    pub ncm: String,
    /// `CFOP`: four-digit operation code.
    pub cfop: String,
    /// `uCom`: commercial unit.
    pub unit: String,
    /// `qCom`: quantity (4 decimal places on the wire).
    pub quantity: Decimal,
    /// `vUnCom`: unit price (4 decimal places on the wire).
    pub unit_price: Decimal,
    /// `vProd`: line total (2 decimal places on the wire).
    pub total: Decimal,
}

/// Payment method (`tPag`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// 01 — Dinheiro.
    Cash,
    /// 02 — Cheque.
    Check,
    /// 03 — Cartão de crédito.
    CreditCard,
    /// 04 — Cartão de débito.
    DebitCard,
    /// 05 — Crédito loja.
    StoreCredit,
    /// 17 — PIX.
    Pix,
    /// 99 — Outros.
    Other,
}

impl PaymentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cash => "01",
            Self::Check => "02",
            Self::CreditCard => "03",
            Self::DebitCard => "04",
            Self::StoreCredit => "05",
            Self::Pix => "17",
            Self::Other => "99",
        }
    }
}

/// One payment entry (`detPag`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    /// `vPag`: amount paid.
    pub amount: Decimal,
    /// `vTroco`: change due. Receipts always emit this field, zero if absent.
    pub change_due: Option<Decimal>,
}

impl Payment {
    pub fn new(method: PaymentMethod, amount: Decimal) -> Self {
        Self {
            method,
            amount,
            change_due: None,
        }
    }

    pub fn with_change(mut self, change: Decimal) -> Self {
        self.change_due = Some(change);
        self
    }
}

/// Technical-responsible-party block (`infRespTec`), mandatory on invoices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechResponsible {
    pub cnpj: String,
    /// `xContato`: contact name.
    pub contact: String,
    pub email: String,
    pub phone: String,
}

/// Fields shared by every document variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub issuer: Issuer,
    pub environment: Environment,
    /// `serie`: integer >= 1.
    pub series: u16,
    /// `nNF`: integer >= 1, unique per issuer+series.
    pub number: u64,
    /// `dhEmi`: issue timestamp with the issuing state's fixed UTC offset.
    pub issued_at: DateTime<FixedOffset>,
    /// `cNF`: 8-digit random numeric nonce.
    pub nonce: u32,
    /// `chNFe`: derived 44-digit access key.
    pub access_key: AccessKey,
    /// `natOp`: nature of the operation.
    pub operation_nature: String,
    pub lines: Vec<DocumentLine>,
    pub payments: Vec<Payment>,
    /// `infCpl`: free-text additional information.
    pub additional_info: Option<String>,
}

impl DocumentInfo {
    /// Issuing state, taken from the issuer's address.
    pub fn uf(&self) -> Uf {
        self.issuer.address.uf
    }

    /// Sum of line totals (`vProd`; with zero-rated placeholder taxes this
    /// also equals `vNF`).
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(|l| l.total).sum()
    }
}

/// NF-e payload: recipient address and technical-responsible blocks are
/// mandatory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub info: DocumentInfo,
    pub recipient: Recipient,
    pub tech_responsible: TechResponsible,
}

/// NFC-e payload: no recipient address, always final-consumer and in-person,
/// carries the QR supplement once generated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub info: DocumentInfo,
    /// Optional identified consumer (tax id + name only).
    pub recipient: Option<Recipient>,
    /// `qrCode`: verification URL, embedded before signing.
    pub qr_code: Option<String>,
    /// `urlChave`: the state's consultation page.
    pub consultation_url: Option<String>,
}

/// One of the two fiscal-document models.
///
/// Both variants expose the signable sub-element id through
/// [`FiscalDocument::signature_reference`], consumed uniformly by the signer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FiscalDocument {
    Invoice(Invoice),
    Receipt(Receipt),
}

impl FiscalDocument {
    pub fn model(&self) -> Model {
        match self {
            Self::Invoice(_) => Model::Invoice,
            Self::Receipt(_) => Model::Receipt,
        }
    }

    pub fn info(&self) -> &DocumentInfo {
        match self {
            Self::Invoice(inv) => &inv.info,
            Self::Receipt(rec) => &rec.info,
        }
    }

    /// `Id` attribute value of the signed `infNFe` element.
    pub fn signature_reference(&self) -> String {
        format!("NFe{}", self.info().access_key.as_str())
    }

    /// Attach the QR verification payload to a receipt. The supplement block
    /// becomes part of the document before signing, so this must happen
    /// before [`crate::xml::to_document_xml`] for receipts.
    pub fn set_qr_code(
        &mut self,
        qr_code: impl Into<String>,
        consultation_url: impl Into<String>,
    ) -> Result<(), FiscalError> {
        match self {
            Self::Receipt(rec) => {
                rec.qr_code = Some(qr_code.into());
                rec.consultation_url = Some(consultation_url.into());
                Ok(())
            }
            Self::Invoice(_) => Err(FiscalError::Validation(
                "invoices (model 55) do not carry a QR code".into(),
            )),
        }
    }
}
