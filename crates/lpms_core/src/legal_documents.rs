//! crates/lpms_core/src/legal_documents.rs
//!
//! The three fixed onboarding documents (power of attorney, service contract,
//! indigency declaration) as layout-free blocks of text. The API layer turns
//! them into PDF.

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

/// Identification and address of the person signing the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartyData {
    pub name: String,
    pub cpf: String,
    pub rg: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub complement: String,
    #[serde(default)]
    pub district: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
}

impl PartyData {
    fn address(&self) -> String {
        let complement = if self.complement.is_empty() {
            String::new()
        } else {
            format!(", {}", self.complement)
        };
        format!(
            "{}, nº {}{}, {}, {}, {}, CEP {}",
            self.street, self.number, complement, self.district, self.city, self.state, self.postal_code
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Centered, bold.
    Title(String),
    /// Bold, left aligned.
    Heading(String),
    /// Wrapped body text.
    Paragraph(String),
    /// Vertical space in lines.
    Space(f32),
    /// A signature line.
    Rule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegalDocument {
    pub file_name: &'static str,
    pub blocks: Vec<Block>,
}

impl LegalDocument {
    /// All text of the document, one block per line. Used for previews and tests.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Title(t) | Block::Heading(t) | Block::Paragraph(t) => Some(t.as_str()),
                Block::Space(_) | Block::Rule => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegalDocumentKind {
    PowerOfAttorney,
    ServiceContract,
    IndigencyDeclaration,
}

const MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

pub fn month_name(date: NaiveDate) -> &'static str {
    MONTHS[date.month0() as usize]
}

fn paragraph(text: impl Into<String>) -> Block {
    Block::Paragraph(text.into())
}

fn signature(blocks: &mut Vec<Block>, lines: &[&str]) {
    blocks.push(Block::Space(2.0));
    blocks.push(Block::Rule);
    for line in lines {
        blocks.push(paragraph(*line));
    }
}

pub fn render(kind: LegalDocumentKind, party: &PartyData, today: NaiveDate) -> LegalDocument {
    match kind {
        LegalDocumentKind::PowerOfAttorney => power_of_attorney(party, today),
        LegalDocumentKind::ServiceContract => service_contract(party, today),
        LegalDocumentKind::IndigencyDeclaration => indigency_declaration(party, today),
    }
}

fn power_of_attorney(party: &PartyData, today: NaiveDate) -> LegalDocument {
    let (day, month, year) = (today.day(), month_name(today), today.year());
    let mut blocks = vec![
        Block::Title("PROCURAÇÃO".to_string()),
        Block::Space(0.5),
        paragraph(format!(
            "Saibam quantos este público instrumento de procuração virem, que no ano de {year}, \
             aos {day} dias do mês de {month} de {year}, nesta cidade, compareceu como outorgante {}, \
             pessoa física, portador(a) da cédula de identidade RG nº {}, inscrito(a) no Cadastro de \
             Pessoa Física sob o nº {}, residente e domiciliado(a) {}.",
            party.name,
            party.rg,
            party.cpf,
            party.address()
        )),
        Block::Space(1.0),
        paragraph(
            "Pelo presente instrumento, outorga poderes especiais aos advogados inscritos na Ordem dos \
             Advogados do Brasil, para que, em seu nome e representação, pratiquem todos os atos necessários \
             à defesa de seus direitos perante os Tribunais do Trabalho, bem como para receber citações, \
             intimações, notificações e demais comunicações processuais.",
        ),
        Block::Space(1.0),
        paragraph(
            "O outorgante autoriza, ainda, os procuradores a transigir, desistir, receber valores, assinar \
             documentos e praticar todos os demais atos que se fizerem necessários à defesa de seus interesses.",
        ),
        Block::Space(2.0),
        paragraph(format!("{}, {day} de {month} de {year}.", party.city)),
    ];
    signature(&mut blocks, &[party.name.as_str()]);
    LegalDocument {
        file_name: "Procuracao.pdf",
        blocks,
    }
}

fn service_contract(party: &PartyData, today: NaiveDate) -> LegalDocument {
    let mut blocks = vec![
        Block::Title("CONTRATO DE PRESTAÇÃO DE SERVIÇOS JURÍDICOS".to_string()),
        Block::Space(1.0),
        Block::Heading("PARTES:".to_string()),
        paragraph(format!(
            "CONTRATANTE: {}, pessoa física, portador(a) da cédula de identidade RG nº {}, inscrito(a) \
             no Cadastro de Pessoa Física sob o nº {}.",
            party.name, party.rg, party.cpf
        )),
        Block::Space(0.5),
        paragraph(
            "CONTRATADA: Escritório de Advocacia, pessoa jurídica, inscrita no CNPJ nº [CNPJ], com sede em [Endereço].",
        ),
    ];
    let clauses = [
        (
            "CLÁUSULA PRIMEIRA - DO OBJETO:",
            "A CONTRATADA se obriga a prestar serviços de consultoria e representação jurídica ao \
             CONTRATANTE, em ações trabalhistas e demais demandas judiciais que se fizerem necessárias.",
        ),
        (
            "CLÁUSULA SEGUNDA - DOS HONORÁRIOS:",
            "Os honorários serão cobrados conforme acordado entre as partes, sendo que a CONTRATADA \
             receberá percentual sobre o valor recuperado ao final do processo.",
        ),
        (
            "CLÁUSULA TERCEIRA - DA VIGÊNCIA:",
            "O presente contrato vigorará a partir da data de sua assinatura até o término do processo \
             ou rescisão por qualquer das partes.",
        ),
    ];
    for (heading, text) in clauses {
        blocks.push(Block::Space(1.0));
        blocks.push(Block::Heading(heading.to_string()));
        blocks.push(paragraph(text));
    }
    blocks.push(Block::Space(2.0));
    blocks.push(paragraph(format!("{}, {}.", party.city, today.format("%d/%m/%Y"))));
    signature(&mut blocks, &[party.name.as_str(), "CONTRATANTE"]);
    LegalDocument {
        file_name: "Contrato.pdf",
        blocks,
    }
}

fn indigency_declaration(party: &PartyData, today: NaiveDate) -> LegalDocument {
    let mut blocks = vec![
        Block::Title("DECLARAÇÃO DE HIPOSSUFICIÊNCIA".to_string()),
        Block::Space(1.0),
        paragraph(format!(
            "Eu, {}, pessoa física, portador(a) da cédula de identidade RG nº {}, inscrito(a) no Cadastro \
             de Pessoa Física sob o nº {}, residente e domiciliado(a) {}, por este instrumento particular, \
             DECLARO, sob as penas da lei, que sou pessoa de insuficientes recursos financeiros para arcar \
             com as custas processuais e despesas decorrentes de ação judicial, razão pela qual solicito o \
             benefício da assistência judiciária gratuita.",
            party.name,
            party.rg,
            party.cpf,
            party.address()
        )),
        Block::Space(1.0),
        paragraph(
            "Declaro, ainda, que não possuo bens ou renda suficientes para custear as despesas do processo \
             sem comprometer meu sustento e de minha família.",
        ),
        Block::Space(2.0),
        paragraph(format!("{}, {}.", party.city, today.format("%d/%m/%Y"))),
    ];
    signature(&mut blocks, &[party.name.as_str()]);
    LegalDocument {
        file_name: "Declaracao_Hipossuficiencia.pdf",
        blocks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn party() -> PartyData {
        PartyData {
            name: "Joao Silva".to_string(),
            cpf: "123.456.789-09".to_string(),
            rg: "1234567".to_string(),
            street: "SQN 210 Bloco A".to_string(),
            number: "101".to_string(),
            complement: String::new(),
            district: "Asa Norte".to_string(),
            city: "Brasília".to_string(),
            state: "DF".to_string(),
            postal_code: "70862-010".to_string(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn power_of_attorney_spells_out_the_date() {
        let doc = render(LegalDocumentKind::PowerOfAttorney, &party(), day());
        let text = doc.plain_text();
        assert!(text.starts_with("PROCURAÇÃO"));
        assert!(text.contains("aos 7 dias do mês de março de 2025"));
        assert!(text.contains("Brasília, 7 de março de 2025."));
        assert_eq!(doc.file_name, "Procuracao.pdf");
    }

    #[test]
    fn empty_complement_leaves_no_dangling_comma() {
        let doc = render(LegalDocumentKind::IndigencyDeclaration, &party(), day());
        assert!(doc.plain_text().contains("SQN 210 Bloco A, nº 101, Asa Norte"));
    }

    #[test]
    fn contract_has_three_clauses_and_two_signature_lines() {
        let doc = render(LegalDocumentKind::ServiceContract, &party(), day());
        let headings = doc
            .blocks
            .iter()
            .filter(|b| matches!(b, Block::Heading(h) if h.starts_with("CLÁUSULA")))
            .count();
        assert_eq!(headings, 3);
        assert!(doc.plain_text().ends_with("Joao Silva\nCONTRATANTE"));
    }
}
