pub const APP_DIR_NAME: &str = "FinScribe";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const ALIAS_CACHE_FILE_NAME: &str = "ticker_cache.json";
pub const MARKET_CACHE_FILE_NAME: &str = "market_data_cache.json";

/// Reserved token an upstream reviewer writes on duplicated lines.
pub const DEFAULT_DUP_MARKER: &str = "[DUP]";

pub const DEFAULT_MERGE_WINDOW_CHARS: usize = 1500;
pub const DEFAULT_MERGE_ANCHOR_SENTENCES: usize = 3;
pub const DEFAULT_MERGE_THRESHOLD: f64 = 0.70;

pub const DEFAULT_BOUNDARY_THRESHOLD: f64 = 0.98;
pub const DEFAULT_GENERAL_THRESHOLD: f64 = 0.95;
pub const DEFAULT_DEDUP_LOOKAHEAD: usize = 5;
pub const DEFAULT_MAX_REMOVAL_FRACTION: f64 = 0.10;
pub const DEFAULT_MARKER_MAX_REMOVAL_FRACTION: f64 = 0.30;

pub const DEFAULT_PERSISTENCE_FLOOR: f64 = 0.90;
pub const DEFAULT_SHORT_TICKER_LEN: usize = 3;
pub const DEFAULT_LATIN_THRESHOLD: f64 = 0.95;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.90;
pub const DEFAULT_AMBIGUITY_MARGIN: f64 = 0.02;
pub const DEFAULT_CONTEXT_WINDOW_CHARS: usize = 200;

pub const DEFAULT_MARKET_TTL_HOURS: i64 = 24;
pub const DEFAULT_LOOKBACK_DAYS: i64 = 5;
pub const DEFAULT_PRICE_TOLERANCE: f64 = 0.15;
pub const DEFAULT_SYMBOL_SUFFIX: &str = ".BK";

pub const DEFAULT_EXTERNAL_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;
pub const DEFAULT_SEARCH_QUERY_SUFFIX: &str = "หุ้น SET ตลาดหลักทรัพย์";

pub const DEFAULT_WORKERS: usize = 4;
pub const MAX_WORKERS: usize = 10;
pub const DEFAULT_REQUEST_BUDGET: usize = 50;

pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
pub const DUCKDUCKGO_API_URL: &str = "https://api.duckduckgo.com/";
pub const HTTP_USER_AGENT: &str = "Mozilla/5.0 (compatible; finscribe/0.2)";
