//! Static page content served to front ends.

use dmerge_types::view::{FaqEntry, Partner};

const FAQ: &[(&str, &str)] = &[
    (
        "What is DAO Merger FHE?",
        "A system for proposing and reviewing DAO mergers and acquisitions in which \
         sensitive financial and member data is kept encoded on the ledger during negotiations.",
    ),
    (
        "How does FHE protect our data?",
        "FHE allows computations on encrypted data without decryption. The current build stores \
         an encoded placeholder that anyone can decode; a real FHE component is required before \
         the data can be considered confidential.",
    ),
    (
        "What data is encrypted?",
        "Treasury balances, member activity metrics and valuation figures are stored encoded.",
    ),
    (
        "Who can see the decrypted data?",
        "Values are revealed in the interface only after the connected account signs the session \
         authorization message.",
    ),
    (
        "What blockchains are supported?",
        "Currently Ethereum and EVM-compatible chains with plans to expand to other ecosystems.",
    ),
];

const PARTNERS: &[(&str, &str, &str)] = &[
    ("Zama", "zama-logo", "https://zama.ai"),
    ("FHE.org", "fhe-logo", "https://fhe.org"),
    ("DAO Alliance", "dao-alliance-logo", "https://daoalliance.org"),
];

pub fn faq() -> Vec<FaqEntry> {
    FAQ.iter()
        .map(|(question, answer)| FaqEntry {
            question: (*question).to_string(),
            answer: (*answer).to_string(),
        })
        .collect()
}

pub fn partners() -> Vec<Partner> {
    PARTNERS
        .iter()
        .map(|(name, logo, url)| Partner {
            name: (*name).to_string(),
            logo: (*logo).to_string(),
            url: (*url).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_faq_entries() {
        let faq = faq();
        assert_eq!(faq.len(), 5);
        assert_eq!(faq[0].question, "What is DAO Merger FHE?");
        assert!(faq.iter().all(|e| !e.answer.is_empty()));
    }

    #[test]
    fn test_partners() {
        let partners = partners();
        assert_eq!(partners.len(), 3);
        assert_eq!(partners[0].url, "https://zama.ai");
        assert!(partners.iter().all(|p| p.url.starts_with("https://")));
    }
}
