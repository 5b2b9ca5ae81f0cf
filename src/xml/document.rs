use crate::core::*;

use super::writer::{XmlResult, XmlWriter, truncate};

/// NF-e 4.00 schema namespace.
pub const NFE_NS: &str = "http://www.portalfiscal.inf.br/nfe";

/// Document layout version.
pub const NFE_VERSION: &str = "4.00";

/// Fixed recipient/product text the authority mandates for staging
/// (homologação) transactions.
pub const STAGING_PLACEHOLDER: &str =
    "NF-E EMITIDA EM AMBIENTE DE HOMOLOGACAO - SEM VALOR FISCAL";

/// Render the complete `<NFe>` document for an invoice or receipt.
///
/// The NF-e schema is position-sensitive: every block's children must appear
/// in the declared order, so each block below is written as an explicit
/// element sequence rather than iterating fields. Receipts must already
/// carry their QR payload (`infNFeSupl` is part of the document handed to
/// the signer).
pub fn to_document_xml(doc: &FiscalDocument) -> XmlResult {
    let info = doc.info();
    if info.issuer.cnpj.is_empty() {
        return Err(ValidationError::new("issuer.cnpj", "tax id is required").into());
    }
    if info.lines.is_empty() {
        return Err(ValidationError::new("lines", "at least one document line is required").into());
    }
    if let FiscalDocument::Receipt(rec) = doc {
        if rec.qr_code.is_none() || rec.consultation_url.is_none() {
            return Err(ValidationError::new(
                "qr_code",
                "receipt QR payload must be generated before assembly",
            )
            .into());
        }
    }

    let model = doc.model();
    let mut w = XmlWriter::new();
    w.start_element_with_attrs("NFe", &[("xmlns", NFE_NS)])?;

    // Attribute order (Id before versao) matches canonical form; the signer
    // digests this element byte-for-byte.
    let reference = doc.signature_reference();
    w.start_element_with_attrs("infNFe", &[("Id", &reference), ("versao", NFE_VERSION)])?;

    write_ide(&mut w, doc)?;
    write_emit(&mut w, &info.issuer)?;
    match doc {
        FiscalDocument::Invoice(inv) => {
            write_dest(&mut w, &inv.recipient, info.environment, true)?;
        }
        FiscalDocument::Receipt(rec) => {
            if let Some(recipient) = &rec.recipient {
                write_dest(&mut w, recipient, info.environment, false)?;
            }
        }
    }
    for (i, line) in info.lines.iter().enumerate() {
        write_det(&mut w, doc, line, i + 1)?;
    }
    write_total(&mut w, info)?;

    // transp: freight mode 9 (no transport) — transport arrangements are an
    // external collaborator's concern.
    w.start_element("transp")?;
    w.text_element("modFrete", "9")?;
    w.end_element("transp")?;

    write_pag(&mut w, info, model)?;

    if let Some(extra) = &info.additional_info {
        w.start_element("infAdic")?;
        w.text_element("infCpl", &truncate(extra, 5000))?;
        w.end_element("infAdic")?;
    }

    if let FiscalDocument::Invoice(inv) = doc {
        write_inf_resp_tec(&mut w, &inv.tech_responsible)?;
    }

    w.end_element("infNFe")?;

    if let FiscalDocument::Receipt(rec) = doc {
        // Supplement block sits between infNFe and the Signature slot; both
        // fields were validated as present above.
        w.start_element("infNFeSupl")?;
        w.text_element("qrCode", rec.qr_code.as_deref().unwrap_or_default())?;
        w.text_element("urlChave", rec.consultation_url.as_deref().unwrap_or_default())?;
        w.end_element("infNFeSupl")?;
    }

    w.end_element("NFe")?;
    w.into_string()
}

fn write_ide(w: &mut XmlWriter, doc: &FiscalDocument) -> Result<(), FiscalError> {
    let info = doc.info();
    let uf = info.uf();
    let is_receipt = matches!(doc, FiscalDocument::Receipt(_));

    w.start_element("ide")?;
    w.text_element("cUF", &uf.code().to_string())?;
    w.text_element("cNF", &format!("{:08}", info.nonce))?;
    w.text_element("natOp", &truncate(&info.operation_nature, 60))?;
    w.text_element("mod", doc.model().code())?;
    w.text_element("serie", &info.series.to_string())?;
    w.text_element("nNF", &info.number.to_string())?;
    w.text_element("dhEmi", &info.issued_at.format("%Y-%m-%dT%H:%M:%S%:z").to_string())?;
    // tpNF 1: outbound operation.
    w.text_element("tpNF", "1")?;
    // idDest 1: internal (same-state) operation.
    w.text_element("idDest", "1")?;
    w.text_element("cMunFG", &info.issuer.address.city_code)?;
    // tpImp: DANFE layout — 1 portrait for invoices, 4 for the NFC-e slip.
    w.text_element("tpImp", if is_receipt { "4" } else { "1" })?;
    w.text_element("tpEmis", &EmissionType::Normal.code().to_string())?;
    w.text_element("cDV", &info.access_key.check_digit().to_string())?;
    w.text_element("tpAmb", &info.environment.code().to_string())?;
    // finNFe 1: normal emission.
    w.text_element("finNFe", "1")?;
    // Receipts always mark final consumer and in-person presence.
    w.text_element("indFinal", if is_receipt { "1" } else { "0" })?;
    w.text_element("indPres", if is_receipt { "1" } else { "0" })?;
    // procEmi 0: issued by the taxpayer's own application.
    w.text_element("procEmi", "0")?;
    w.text_element(
        "verProc",
        concat!("notafiscal ", env!("CARGO_PKG_VERSION")),
    )?;
    w.end_element("ide")?;
    Ok(())
}

fn write_address(w: &mut XmlWriter, tag: &str, address: &Address) -> Result<(), FiscalError> {
    w.start_element(tag)?;
    w.text_element("xLgr", &truncate(&address.street, 60))?;
    w.text_element("nro", &truncate(&address.number, 60))?;
    w.text_element("xBairro", &truncate(&address.district, 60))?;
    w.text_element("cMun", &address.city_code)?;
    w.text_element("xMun", &truncate(&address.city_name, 60))?;
    w.text_element("UF", address.uf.sigla())?;
    w.opt_text_element("CEP", &address.postal_code)?;
    w.text_element("cPais", "1058")?;
    w.text_element("xPais", "BRASIL")?;
    w.end_element(tag)?;
    Ok(())
}

fn write_emit(w: &mut XmlWriter, issuer: &Issuer) -> Result<(), FiscalError> {
    w.start_element("emit")?;
    w.text_element("CNPJ", &issuer.cnpj)?;
    w.text_element("xNome", &truncate(&issuer.legal_name, 60))?;
    if let Some(trade) = &issuer.trade_name {
        w.text_element("xFant", &truncate(trade, 60))?;
    }
    write_address(w, "enderEmit", &issuer.address)?;
    w.text_element("IE", &issuer.state_registration)?;
    w.text_element("CRT", &issuer.tax_regime.code().to_string())?;
    w.end_element("emit")?;
    Ok(())
}

fn write_dest(
    w: &mut XmlWriter,
    recipient: &Recipient,
    environment: Environment,
    with_address: bool,
) -> Result<(), FiscalError> {
    w.start_element("dest")?;
    let tag = if recipient.tax_id.len() == 11 {
        "CPF"
    } else {
        "CNPJ"
    };
    w.text_element(tag, &recipient.tax_id)?;
    let name = if environment == Environment::Staging {
        STAGING_PLACEHOLDER
    } else {
        &recipient.name
    };
    w.text_element("xNome", &truncate(name, 60))?;
    if with_address {
        if let Some(address) = &recipient.address {
            write_address(w, "enderDest", address)?;
        }
    }
    // indIEDest 9: recipient not an ICMS taxpayer.
    w.text_element("indIEDest", "9")?;
    w.end_element("dest")?;
    Ok(())
}

fn write_det(
    w: &mut XmlWriter,
    doc: &FiscalDocument,
    line: &DocumentLine,
    item: usize,
) -> Result<(), FiscalError> {
    let info = doc.info();
    let description = if info.environment == Environment::Staging
        && matches!(doc, FiscalDocument::Invoice(_))
    {
        STAGING_PLACEHOLDER.to_string()
    } else {
        truncate(&line.description, 120)
    };

    w.start_element_with_attrs("det", &[("nItem", &item.to_string())])?;

    w.start_element("prod")?;
    w.text_element("cProd", &truncate(&line.product_code, 60))?;
    w.text_element("cEAN", "SEM GTIN")?;
    w.text_element("xProd", &description)?;
    w.text_element("NCM", &line.ncm)?;
    w.text_element("CFOP", &line.cfop)?;
    w.text_element("uCom", &truncate(&line.unit, 6))?;
    w.quantity_element("qCom", line.quantity)?;
    w.quantity_element("vUnCom", line.unit_price)?;
    w.amount_element("vProd", line.total)?;
    w.text_element("cEANTrib", "SEM GTIN")?;
    w.text_element("uTrib", &truncate(&line.unit, 6))?;
    w.quantity_element("qTrib", line.quantity)?;
    w.quantity_element("vUnTrib", line.unit_price)?;
    // indTot 1: line total composes the document total.
    w.text_element("indTot", "1")?;
    w.end_element("prod")?;

    // Zero-rated placeholder tax groups; actual tax computation is an
    // external collaborator's responsibility.
    w.start_element("imposto")?;
    w.start_element("ICMS")?;
    match info.issuer.tax_regime {
        TaxRegime::Simplified => {
            w.start_element("ICMSSN102")?;
            w.text_element("orig", "0")?;
            w.text_element("CSOSN", "102")?;
            w.end_element("ICMSSN102")?;
        }
        TaxRegime::Standard => {
            w.start_element("ICMS00")?;
            w.text_element("orig", "0")?;
            w.text_element("CST", "00")?;
            w.text_element("modBC", "3")?;
            w.text_element("vBC", "0.00")?;
            w.text_element("pICMS", "0.00")?;
            w.text_element("vICMS", "0.00")?;
            w.end_element("ICMS00")?;
        }
    }
    w.end_element("ICMS")?;
    w.start_element("PIS")?;
    w.start_element("PISNT")?;
    w.text_element("CST", "07")?;
    w.end_element("PISNT")?;
    w.end_element("PIS")?;
    w.start_element("COFINS")?;
    w.start_element("COFINSNT")?;
    w.text_element("CST", "07")?;
    w.end_element("COFINSNT")?;
    w.end_element("COFINS")?;
    w.end_element("imposto")?;

    w.end_element("det")?;
    Ok(())
}

fn write_total(w: &mut XmlWriter, info: &DocumentInfo) -> Result<(), FiscalError> {
    let zero = "0.00";
    let total = info.total();
    w.start_element("total")?;
    w.start_element("ICMSTot")?;
    w.text_element("vBC", zero)?;
    w.text_element("vICMS", zero)?;
    w.text_element("vICMSDeson", zero)?;
    w.text_element("vFCP", zero)?;
    w.text_element("vBCST", zero)?;
    w.text_element("vST", zero)?;
    w.text_element("vFCPST", zero)?;
    w.text_element("vFCPSTRet", zero)?;
    w.amount_element("vProd", total)?;
    w.text_element("vFrete", zero)?;
    w.text_element("vSeg", zero)?;
    w.text_element("vDesc", zero)?;
    w.text_element("vII", zero)?;
    w.text_element("vIPI", zero)?;
    w.text_element("vIPIDevol", zero)?;
    w.text_element("vPIS", zero)?;
    w.text_element("vCOFINS", zero)?;
    w.text_element("vOutro", zero)?;
    w.amount_element("vNF", total)?;
    w.end_element("ICMSTot")?;
    w.end_element("total")?;
    Ok(())
}

fn write_pag(w: &mut XmlWriter, info: &DocumentInfo, model: Model) -> Result<(), FiscalError> {
    w.start_element("pag")?;
    if info.payments.is_empty() {
        // tPag 90: no payment (e.g. adjustment operations).
        w.start_element("detPag")?;
        w.text_element("tPag", "90")?;
        w.text_element("vPag", "0.00")?;
        w.end_element("detPag")?;
    } else {
        for payment in &info.payments {
            w.start_element("detPag")?;
            w.text_element("tPag", payment.method.code())?;
            w.amount_element("vPag", payment.amount)?;
            w.end_element("detPag")?;
        }
    }
    if model == Model::Receipt {
        // Receipts always carry change-due, zero when absent.
        let change = info
            .payments
            .iter()
            .filter_map(|p| p.change_due)
            .sum::<rust_decimal::Decimal>();
        w.amount_element("vTroco", change)?;
    }
    w.end_element("pag")?;
    Ok(())
}

fn write_inf_resp_tec(w: &mut XmlWriter, resp: &TechResponsible) -> Result<(), FiscalError> {
    w.start_element("infRespTec")?;
    w.text_element("CNPJ", &resp.cnpj)?;
    w.text_element("xContato", &truncate(&resp.contact, 60))?;
    w.text_element("email", &truncate(&resp.email, 60))?;
    w.text_element("fone", &resp.phone)?;
    w.end_element("infRespTec")?;
    Ok(())
}
