//! Trading-chatter lexicon.
//!
//! Static catalogues consumed by [`crate::relevance::RelevanceScorer`]:
//! jargon keywords, structural "action + price" patterns, and directional
//! glyphs. Regex strings are compiled once when the scorer is built.

/// A structural pattern pairing an action or level keyword with a number.
pub struct StructurePattern {
    /// Short kebab-case label reported in assessments.
    pub label: &'static str,
    pub pattern: &'static str,
}

/// Trading jargon counted by occurrence. ASCII terms match case-insensitively
/// on word boundaries; CJK terms match as plain substrings.
pub static KEYWORDS: &[&str] = &[
    // ---- Positions -----------------------------------------------------
    "做多",
    "做空",
    "多单",
    "空单",
    "开仓",
    "建仓",
    "加仓",
    "减仓",
    "补仓",
    "平仓",
    "清仓",
    "仓位",
    "爆仓",
    // ---- Levels and price action ---------------------------------------
    "支撑",
    "阻力",
    "压力位",
    "站上",
    "突破",
    "跌破",
    "回踩",
    "回调",
    "反弹",
    "新高",
    "新低",
    "点位",
    // ---- Risk and execution --------------------------------------------
    "止损",
    "止盈",
    "目标位",
    "留意",
    "入场",
    "进场",
    "离场",
    "杠杆",
    "合约",
    // ---- English -------------------------------------------------------
    "long",
    "short",
    "buy",
    "sell",
    "entry",
    "stop loss",
    "take profit",
    "support",
    "resistance",
    "breakout",
    "bullish",
    "bearish",
    "btc",
    "eth",
];

pub static STRUCTURE_PATTERNS: &[StructurePattern] = &[
    StructurePattern {
        label: "breakout-level",
        pattern: r"(?i)(?:站上|突破|升破|break(?:s|ing)?\s+above)\s*[:：]?\s*\d",
    },
    StructurePattern {
        label: "breakdown-level",
        pattern: r"(?i)(?:跌破|破位|失守|break(?:s|ing)?\s+below)\s*[:：]?\s*\d",
    },
    StructurePattern {
        label: "watch-level",
        pattern: r"(?i)(?:留意|关注|注意|\bwatch(?:ing)?)\s*[:：]?\s*\d",
    },
    StructurePattern {
        label: "support-resistance-level",
        pattern: r"(?i)(?:(?:支撑|阻力|压力|\bsupport|\bresistance)\s*(?:位|at)?\s*[:：]?\s*\d|\d\s*(?:附近|一线)?\s*的?\s*(?:支撑|阻力|压力))",
    },
    StructurePattern {
        label: "stop-level",
        pattern: r"(?i)(?:止损|止盈|stop\s*loss|take\s*profit|\bsl\b|\btp\b)\s*(?:位|at)?\s*[:：]?\s*\d",
    },
    StructurePattern {
        label: "entry-level",
        pattern: r"(?i)(?:入场|进场|做多|做空|\bentry|\blong|\bshort|\bbuy|\bsell)\s*(?:@|at|价)?\s*[:：]?\s*\d",
    },
    StructurePattern {
        label: "target-level",
        pattern: r"(?i)(?:目标|\btarget)\s*(?:位|价)?\s*[:：]?\s*\d",
    },
];

/// Numeric tokens: plain, decimal, or thousands-grouped numbers.
pub const NUMBER_PATTERN: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?";

/// A price range such as `104000-106000`, or a standalone offset such as
/// `-300` or `~106000`. Dates and `"id":-5` style fields do not match.
pub const RANGE_PATTERN: &str = r"\d{3,}\s?[-~～]\s?\d{3,}|(?:^|[^0-9A-Za-z.:_-])[-~～]\s?\d";

pub static SYMBOL_GLYPHS: &[char] = &[
    '↑', '↓', '↗', '↘', '⬆', '⬇', '📈', '📉', '🚀', '🔥', '⚠', '✅', '❌', '🟢', '🔴', '💰',
    '🎯',
];
