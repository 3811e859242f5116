//! Watchlist normalisation and the handful of companies we know by name.

pub const DEFAULT_WATCHLIST: &[&str] = &["TSLA", "AAPL", "GOOGL", "MSFT", "AMZN", "NVDA"];

struct Company {
    ticker: &'static str,
    name: &'static str,
    aliases: &'static [&'static str],
    context: &'static str,
}

const COMPANIES: &[Company] = &[
    Company {
        ticker: "TSLA",
        name: "Tesla",
        aliases: &["tesla"],
        context: "Tesla is known for high volatility driven by EV market trends, production updates, and regulatory news.",
    },
    Company {
        ticker: "AAPL",
        name: "Apple",
        aliases: &["apple"],
        context: "Apple typically moves on product announcements, earnings, supply chain news, and broader tech sentiment.",
    },
    Company {
        ticker: "GOOGL",
        name: "Google Alphabet",
        aliases: &["google", "alphabet"],
        context: "Alphabet responds to advertising market changes, AI developments, and regulatory concerns.",
    },
    Company {
        ticker: "MSFT",
        name: "Microsoft",
        aliases: &["microsoft"],
        context: "Microsoft is influenced by cloud computing growth, enterprise software adoption, and AI initiatives.",
    },
    Company {
        ticker: "AMZN",
        name: "Amazon",
        aliases: &["amazon"],
        context: "Amazon moves on e-commerce trends, AWS cloud performance, and logistics developments.",
    },
    Company {
        ticker: "NVDA",
        name: "NVIDIA",
        aliases: &["nvidia"],
        context: "NVIDIA is highly sensitive to AI and GPU demand, gaming trends, and semiconductor market conditions.",
    },
];

fn company(symbol: &str) -> Option<&'static Company> {
    COMPANIES
        .iter()
        .find(|c| c.ticker.eq_ignore_ascii_case(symbol))
}

pub fn normalize(symbol: &str) -> String {
    symbol.trim().trim_start_matches('$').to_uppercase()
}

/// Parse a comma-separated list, keeping first-seen order and dropping blanks and repeats.
pub fn parse_watchlist(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for sym in raw.split(',').map(normalize).filter(|s| !s.is_empty()) {
        if !out.contains(&sym) {
            out.push(sym);
        }
    }
    out
}

pub fn company_name(symbol: &str) -> Option<&'static str> {
    company(symbol).map(|c| c.name)
}

pub fn company_context(symbol: &str) -> Option<&'static str> {
    company(symbol).map(|c| c.context)
}

/// Ticker for a company name mentioned in free text, e.g. "tesla" -> TSLA.
pub fn ticker_for_alias(word: &str) -> Option<&'static str> {
    let word = word.to_ascii_lowercase();
    COMPANIES
        .iter()
        .find(|c| c.aliases.contains(&word.as_str()))
        .map(|c| c.ticker)
}
