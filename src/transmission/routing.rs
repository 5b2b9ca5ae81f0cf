use crate::core::{Environment, FiscalError, Uf};

/// The SEFAZ web-service operations this pipeline calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// NFeAutorizacao4: submit a document batch.
    Authorization,
    /// NFeRetAutorizacao4: fetch the result of an async batch.
    ReturnAuthorization,
    /// NfeStatusServico4: service health / pre-flight check.
    StatusService,
    /// NFeRecepcaoEvento4: submit events (cancellation).
    EventReception,
    /// NfeInutilizacao4: invalidate a number range.
    Invalidation,
}

/// Endpoint cluster a state's traffic is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    /// The state operates its own web services.
    RegionOperated,
    /// SVAN — Sefaz Virtual do Ambiente Nacional.
    FederatedA,
    /// SVRS — Sefaz Virtual do Rio Grande do Sul (default).
    FederatedB,
}

impl Service {
    /// WSDL namespace of the operation.
    pub fn namespace(&self) -> &'static str {
        match self {
            Self::Authorization => "http://www.portalfiscal.inf.br/nfe/wsdl/NFeAutorizacao4",
            Self::ReturnAuthorization => {
                "http://www.portalfiscal.inf.br/nfe/wsdl/NFeRetAutorizacao4"
            }
            Self::StatusService => "http://www.portalfiscal.inf.br/nfe/wsdl/NFeStatusServico4",
            Self::EventReception => "http://www.portalfiscal.inf.br/nfe/wsdl/NFeRecepcaoEvento4",
            Self::Invalidation => "http://www.portalfiscal.inf.br/nfe/wsdl/NFeInutilizacao4",
        }
    }

    /// `SOAPAction` header value: WSDL namespace + operation name.
    pub fn soap_action(&self) -> &'static str {
        match self {
            Self::Authorization => {
                "http://www.portalfiscal.inf.br/nfe/wsdl/NFeAutorizacao4/nfeAutorizacaoLote"
            }
            Self::ReturnAuthorization => {
                "http://www.portalfiscal.inf.br/nfe/wsdl/NFeRetAutorizacao4/nfeRetAutorizacaoLote"
            }
            Self::StatusService => {
                "http://www.portalfiscal.inf.br/nfe/wsdl/NFeStatusServico4/nfeStatusServicoNF"
            }
            Self::EventReception => {
                "http://www.portalfiscal.inf.br/nfe/wsdl/NFeRecepcaoEvento4/nfeRecepcaoEvento"
            }
            Self::Invalidation => {
                "http://www.portalfiscal.inf.br/nfe/wsdl/NFeInutilizacao4/nfeInutilizacaoNF"
            }
        }
    }
}

/// Which cluster serves a state.
///
/// Resolution order: region-operated set first, then the SVAN subset,
/// then SVRS for everyone else.
pub fn cluster_for(uf: Uf) -> Cluster {
    use Uf::*;
    match uf {
        Am | Ba | Go | Mg | Ms | Mt | Pe | Pr | Rs | Sp => Cluster::RegionOperated,
        Ma => Cluster::FederatedA,
        _ => Cluster::FederatedB,
    }
}

// URL path styles. Most region-operated services are either classic .asmx
// endpoints or Java service paths; the host varies per state/environment.
fn asmx_path(service: Service) -> &'static str {
    match service {
        Service::Authorization => "/ws/NFeAutorizacao4.asmx",
        Service::ReturnAuthorization => "/ws/NFeRetAutorizacao4.asmx",
        Service::StatusService => "/ws/NFeStatusServico4.asmx",
        Service::EventReception => "/ws/NFeRecepcaoEvento4.asmx",
        Service::Invalidation => "/ws/NFeInutilizacao4.asmx",
    }
}

fn services_path(service: Service) -> &'static str {
    match service {
        Service::Authorization => "/services/NFeAutorizacao4",
        Service::ReturnAuthorization => "/services/NFeRetAutorizacao4",
        Service::StatusService => "/services/NFeStatusServico4",
        Service::EventReception => "/services/NFeRecepcaoEvento4",
        Service::Invalidation => "/services/NFeInutilizacao4",
    }
}

fn region_base(uf: Uf, environment: Environment) -> Option<(&'static str, bool)> {
    use Environment::*;
    use Uf::*;
    // (base host, uses .asmx paths)
    let entry = match (uf, environment) {
        (Sp, Production) => ("https://nfe.fazenda.sp.gov.br", true),
        (Sp, Staging) => ("https://homologacao.nfe.fazenda.sp.gov.br", true),
        (Mg, Production) => ("https://nfe.fazenda.mg.gov.br/nfe2", false),
        (Mg, Staging) => ("https://hnfe.fazenda.mg.gov.br/nfe2", false),
        (Rs, Production) => ("https://nfe.sefazrs.rs.gov.br", true),
        (Rs, Staging) => ("https://nfe-homologacao.sefazrs.rs.gov.br", true),
        (Pr, Production) => ("https://nfe.sefa.pr.gov.br/nfe", false),
        (Pr, Staging) => ("https://homologacao.nfe.sefa.pr.gov.br/nfe", false),
        (Ba, Production) => ("https://nfe.sefaz.ba.gov.br/webservices", true),
        (Ba, Staging) => ("https://hnfe.sefaz.ba.gov.br/webservices", true),
        (Go, Production) => ("https://nfe.sefaz.go.gov.br/nfe", false),
        (Go, Staging) => ("https://homolog.sefaz.go.gov.br/nfe", false),
        (Mt, Production) => ("https://nfe.sefaz.mt.gov.br/nfews/v2", false),
        (Mt, Staging) => ("https://homologacao.sefaz.mt.gov.br/nfews/v2", false),
        (Ms, Production) => ("https://nfe.sefaz.ms.gov.br", true),
        (Ms, Staging) => ("https://homologacao.nfe.sefaz.ms.gov.br", true),
        (Pe, Production) => ("https://nfe.sefaz.pe.gov.br/nfe-service", false),
        (Pe, Staging) => ("https://nfehomolog.sefaz.pe.gov.br/nfe-service", false),
        (Am, Production) => ("https://nfe.sefaz.am.gov.br/services2", false),
        (Am, Staging) => ("https://homnfe.sefaz.am.gov.br/services2", false),
        _ => return None,
    };
    Some(entry)
}

fn federated_a_base(environment: Environment) -> &'static str {
    match environment {
        Environment::Production => "https://www.sefazvirtual.fazenda.gov.br",
        Environment::Staging => "https://hom.sefazvirtual.fazenda.gov.br",
    }
}

fn federated_a_path(service: Service) -> &'static str {
    match service {
        Service::Authorization => "/NFeAutorizacao4/NFeAutorizacao4.asmx",
        Service::ReturnAuthorization => "/NFeRetAutorizacao4/NFeRetAutorizacao4.asmx",
        Service::StatusService => "/NFeStatusServico4/NFeStatusServico4.asmx",
        Service::EventReception => "/NFeRecepcaoEvento4/NFeRecepcaoEvento4.asmx",
        Service::Invalidation => "/NFeInutilizacao4/NFeInutilizacao4.asmx",
    }
}

fn federated_b_base(environment: Environment) -> &'static str {
    match environment {
        Environment::Production => "https://nfe.svrs.rs.gov.br",
        Environment::Staging => "https://nfe-homologacao.svrs.rs.gov.br",
    }
}

fn federated_b_path(service: Service) -> &'static str {
    match service {
        Service::Authorization => "/ws/NfeAutorizacao/NFeAutorizacao4.asmx",
        Service::ReturnAuthorization => "/ws/NfeRetAutorizacao/NFeRetAutorizacao4.asmx",
        Service::StatusService => "/ws/NfeStatusServico/NfeStatusServico4.asmx",
        Service::EventReception => "/ws/recepcaoevento/recepcaoevento4.asmx",
        Service::Invalidation => "/ws/nfeinutilizacao/nfeinutilizacao4.asmx",
    }
}

/// Resolve the endpoint URL for (state, service, environment).
///
/// A state in none of the configured sets falls through to SVRS; a
/// configured state with no URL table entry is an unrecoverable
/// configuration error.
pub fn resolve(uf: Uf, service: Service, environment: Environment) -> Result<String, FiscalError> {
    match cluster_for(uf) {
        Cluster::RegionOperated => {
            let (base, asmx) = region_base(uf, environment).ok_or_else(|| {
                FiscalError::Routing(format!(
                    "no endpoint configured for {uf} {service:?} in {environment:?}"
                ))
            })?;
            let path = if asmx {
                asmx_path(service)
            } else {
                services_path(service)
            };
            Ok(format!("{base}{path}"))
        }
        Cluster::FederatedA => Ok(format!(
            "{}{}",
            federated_a_base(environment),
            federated_a_path(service)
        )),
        Cluster::FederatedB => Ok(format!(
            "{}{}",
            federated_b_base(environment),
            federated_b_path(service)
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_SERVICES: [Service; 5] = [
        Service::Authorization,
        Service::ReturnAuthorization,
        Service::StatusService,
        Service::EventReception,
        Service::Invalidation,
    ];

    #[test]
    fn region_operated_states_use_own_hosts() {
        let url = resolve(Uf::Sp, Service::Authorization, Environment::Production).unwrap();
        assert_eq!(url, "https://nfe.fazenda.sp.gov.br/ws/NFeAutorizacao4.asmx");

        let url = resolve(Uf::Mg, Service::StatusService, Environment::Staging).unwrap();
        assert!(url.starts_with("https://hnfe.fazenda.mg.gov.br"));
    }

    #[test]
    fn svan_subset_routes_to_cluster_a() {
        assert_eq!(cluster_for(Uf::Ma), Cluster::FederatedA);
        for service in ALL_SERVICES {
            let url = resolve(Uf::Ma, service, Environment::Production).unwrap();
            assert!(url.contains("sefazvirtual.fazenda.gov.br"), "{url}");
        }
    }

    #[test]
    fn unlisted_states_default_to_cluster_b() {
        for uf in [Uf::Sc, Uf::Rj, Uf::Es, Uf::To, Uf::Df] {
            assert_eq!(cluster_for(uf), Cluster::FederatedB);
            for service in ALL_SERVICES {
                let url = resolve(uf, service, Environment::Production).unwrap();
                assert!(url.contains("svrs.rs.gov.br"), "{url}");
            }
        }
    }

    #[test]
    fn staging_and_production_differ() {
        let prod = resolve(Uf::Sc, Service::Authorization, Environment::Production).unwrap();
        let hom = resolve(Uf::Sc, Service::Authorization, Environment::Staging).unwrap();
        assert_ne!(prod, hom);
        assert!(hom.contains("homologacao"));
    }

    #[test]
    fn soap_actions_embed_the_namespace() {
        for service in ALL_SERVICES {
            assert!(service.soap_action().starts_with(service.namespace()));
        }
    }
}
