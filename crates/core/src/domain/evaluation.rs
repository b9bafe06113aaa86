use std::fmt;

/// Upside (in percent) above which a Buy/Strong Buy consensus turns into an accumulate call.
const BULLISH_UPSIDE_PCT: f64 = 15.0;

const BULLISH_LABELS: [&str; 2] = ["Buy", "Strong Buy"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Analysts see meaningful upside and rate the name a buy.
    Accumulate { upside_pct: f64 },
    /// Price already trades above the mean target.
    TakeProfit,
    /// Within the fair-value band of the mean target.
    FairValue { target_price: f64 },
    InsufficientData,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Accumulate { upside_pct } => {
                write!(f, "分析師看好潛在漲幅 {upside_pct:.1}%，建議分批買進。")
            }
            Evaluation::TakeProfit => {
                f.write_str("目前價格已高於分析師平均目標價，建議觀望或適度止盈。")
            }
            Evaluation::FairValue { target_price } => {
                write!(f, "價格接近合理區間，目標價 ${}。", format_price(*target_price))
            }
            Evaluation::InsufficientData => {
                f.write_str("目前缺乏足夠分析師數據，建議參考技術面走勢。")
            }
        }
    }
}

/// Three-way call on analyst consensus. Zero prices count as missing.
pub fn evaluate(price: Option<f64>, target_price: Option<f64>, recommendation: &str) -> Evaluation {
    let price = price.filter(|p| *p != 0.0);
    let target = target_price.filter(|t| *t != 0.0);

    let (Some(price), Some(target)) = (price, target) else {
        return Evaluation::InsufficientData;
    };

    let upside_pct = (target - price) / price * 100.0;
    if upside_pct > BULLISH_UPSIDE_PCT && BULLISH_LABELS.contains(&recommendation) {
        Evaluation::Accumulate { upside_pct }
    } else if upside_pct < 0.0 {
        Evaluation::TakeProfit
    } else {
        Evaluation::FairValue {
            target_price: target,
        }
    }
}

// Whole prices keep one decimal ("1050.0") so targets read like quoted prices.
fn format_price(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
