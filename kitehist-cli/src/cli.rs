use clap::Parser;

/// Download historical bars from Zerodha Kite Connect as CSV.
#[derive(Debug, Parser)]
#[command(name = "kitehist", version, about)]
pub struct Cli {
    /// Application to run; `download` (or `dl`) is the only one.
    #[arg(long)]
    pub app: Option<String>,

    /// Inclusive start, UTC, formatted `yyyyMMdd-HH:mm:ss`.
    #[arg(long = "from-date")]
    pub from_date: Option<String>,

    /// End, UTC, formatted `yyyyMMdd-HH:mm:ss`; defaults to now.
    #[arg(long = "to-date")]
    pub to_date: Option<String>,

    /// `minute`, `hour` or `daily`; empty selects minute.
    #[arg(long, default_value = "")]
    pub resolution: String,

    /// Market of the tickers; empty selects india.
    #[arg(long, default_value = "")]
    pub market: String,

    /// Security type of the tickers; empty selects equity.
    #[arg(long = "security-type", default_value = "")]
    pub security_type: String,

    /// Comma-separated tickers.
    #[arg(long, value_delimiter = ',')]
    pub tickers: Vec<String>,

    /// Additional tickers.
    #[arg(value_name = "TICKER")]
    pub positional: Vec<String>,

    /// Kite Connect app key.
    #[arg(long, env = "KITE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Kite Connect session token.
    #[arg(long, env = "KITE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Kite Connect API root.
    #[arg(long, env = "KITE_BASE_URL")]
    pub base_url: Option<String>,
}

impl Cli {
    /// Tickers from `--tickers` then positionals, trimmed, blank and repeated entries removed.
    pub fn tickers(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for t in self.tickers.iter().chain(&self.positional) {
            let t = t.trim().to_ascii_uppercase();
            if !t.is_empty() && !out.contains(&t) {
                out.push(t);
            }
        }
        out
    }
}
