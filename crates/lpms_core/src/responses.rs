//! crates/lpms_core/src/responses.rs
//!
//! Canned replies to common client questions.

use std::collections::BTreeMap;

use crate::domain::ResponseKind;

const CASE_STATUS: &str = "Prezado(a) [CLIENTE],

Obrigado por entrar em contato conosco.

Sobre o andamento do seu processo n [PROCESSO]:

O processo encontra-se em fase de [FASE]. O ultimo andamento foi registrado em [DATA], quando [EVENTO].

O proximo prazo importante e em [PROXIMO_PRAZO], quando [ACAO].

Continuamos acompanhando seu caso com atencao e o manteremos informado sobre qualquer desenvolvimento importante.

Qualquer duvida, nao hesite em entrar em contato.

Atenciosamente,
Equipe Juridica";

const DOCUMENTS: &str = "Prezado(a) [CLIENTE],

Obrigado por sua pergunta.

Os documentos necessarios para seu caso sao:

1. [DOC1]
2. [DOC2]
3. [DOC3]

Por favor, envie-nos esses documentos assim que possivel para que possamos prosseguir com seu processo.

Caso tenha duvidas sobre como obter esses documentos, estamos a disposicao para ajuda-lo.

Atenciosamente,
Equipe Juridica";

const DEADLINES: &str = "Prezado(a) [CLIENTE],

Obrigado por entrar em contato.

Os prazos importantes do seu processo sao:

- [PRAZO1]: [DESCRICAO1]
- [PRAZO2]: [DESCRICAO2]
- [PRAZO3]: [DESCRICAO3]

Estamos acompanhando todos esses prazos para garantir que nenhum seja perdido.

Atenciosamente,
Equipe Juridica";

const FEES: &str = "Prezado(a) [CLIENTE],

Obrigado por sua pergunta sobre os honorarios.

Conforme contrato assinado entre as partes, os honorarios sao:

[DETALHES_HONORARIOS]

O pagamento pode ser realizado em [FORMAS_PAGAMENTO].

Caso tenha duvidas, estamos a disposicao.

Atenciosamente,
Equipe Juridica";

const OTHER: &str = "Prezado(a) [CLIENTE],

Obrigado por entrar em contato conosco.

[RESPOSTA_PERSONALIZADA]

Caso tenha outras duvidas, nao hesite em nos contatar.

Atenciosamente,
Equipe Juridica";

pub fn template(kind: ResponseKind) -> &'static str {
    match kind {
        ResponseKind::CaseStatus => CASE_STATUS,
        ResponseKind::Documents => DOCUMENTS,
        ResponseKind::Deadlines => DEADLINES,
        ResponseKind::Fees => FEES,
        ResponseKind::Other => OTHER,
    }
}

/// A filled template and the placeholders nobody supplied a value for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedResponse {
    pub body: String,
    pub unresolved: Vec<String>,
}

/// Substitutes `[NAME]` tokens with `values` (keys without brackets).
///
/// Tokens without a value stay in the text so the attorney can fill them in.
pub fn render(kind: ResponseKind, values: &BTreeMap<String, String>) -> RenderedResponse {
    let mut body = template(kind).to_string();
    for (name, value) in values {
        body = body.replace(&format!("[{name}]"), value);
    }
    RenderedResponse {
        unresolved: placeholders(&body),
        body,
    }
}

/// Upper-case bracketed tokens such as `[PROXIMO_PRAZO]`, in order of appearance.
pub fn placeholders(text: &str) -> Vec<String> {
    let mut found = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('[') {
        let after = &rest[start + 1..];
        let Some(end) = after.find(']') else { break };
        let name = &after[..end];
        let is_token = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_');
        if is_token && !found.iter().any(|f| f == name) {
            found.push(name.to_string());
        }
        rest = &after[end + 1..];
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn fills_supplied_values_and_reports_the_rest() {
        let rendered = render(
            ResponseKind::CaseStatus,
            &values(&[("CLIENTE", "Joao Silva"), ("PROCESSO", "0001234-56.2023.5.10.0001")]),
        );
        assert!(rendered.body.starts_with("Prezado(a) Joao Silva,"));
        assert!(rendered.body.contains("processo n 0001234-56.2023.5.10.0001:"));
        assert_eq!(
            rendered.unresolved,
            vec!["FASE", "DATA", "EVENTO", "PROXIMO_PRAZO", "ACAO"]
        );
    }

    #[test]
    fn fully_resolved_template_has_no_placeholders() {
        let rendered = render(
            ResponseKind::Other,
            &values(&[("CLIENTE", "Ana"), ("RESPOSTA_PERSONALIZADA", "Seu pedido foi recebido.")]),
        );
        assert!(rendered.unresolved.is_empty());
        assert!(rendered.body.contains("Seu pedido foi recebido."));
    }

    #[test]
    fn placeholder_scan_ignores_lowercase_brackets() {
        assert_eq!(placeholders("[a] [B1] [B1] [x_Y] [C_D]"), vec!["B1", "C_D"]);
    }
}
