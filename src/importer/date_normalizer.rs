// ==========================================
// 表更新系统 - 日期规范化
// ==========================================
// 职责: 把常见日期写法统一为 YYYY-MM-DD
// 背景: Excel 会把日期自动改写为 M/D/YYYY 等格式
// 保证: 幂等; 无法识别/校验失败时原样返回，最终合法性由存储裁决
// ==========================================

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

struct DatePattern {
    regex: Regex,
    /// 捕获组顺序 → (年, 月, 日) 的下标
    ymd: (usize, usize, usize),
}

/// 识别的字面格式（按优先级排列，仅编译一次）
fn date_patterns() -> &'static [DatePattern] {
    static PATTERNS: OnceLock<Vec<DatePattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            // M/D/YYYY 或 MM/DD/YYYY（Excel 最常见）
            DatePattern {
                regex: Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").expect("日期正则非法"),
                ymd: (3, 1, 2),
            },
            // M-D-YYYY 或 MM-DD-YYYY
            DatePattern {
                regex: Regex::new(r"^(\d{1,2})-(\d{1,2})-(\d{4})$").expect("日期正则非法"),
                ymd: (3, 1, 2),
            },
            // YYYY/M/D
            DatePattern {
                regex: Regex::new(r"^(\d{4})/(\d{1,2})/(\d{1,2})$").expect("日期正则非法"),
                ymd: (1, 2, 3),
            },
            // YYYY-M-D（已是规范形状，重新校验并补零）
            DatePattern {
                regex: Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").expect("日期正则非法"),
                ymd: (1, 2, 3),
            },
        ]
    })
}

/// 把文本日期规范化为 YYYY-MM-DD
///
/// 每个候选改写都按真实日历日期校验（13 月之类落到下一个模式）；
/// 全部不匹配/不通过时返回原值，不报错。
pub fn normalize(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return value.to_string();
    }

    for pattern in date_patterns() {
        if let Some(caps) = pattern.regex.captures(trimmed) {
            let (y_idx, m_idx, d_idx) = pattern.ymd;
            let candidate = format!(
                "{}-{:0>2}-{:0>2}",
                &caps[y_idx], &caps[m_idx], &caps[d_idx]
            );

            // 改写后必须是合法日历日期，否则继续尝试下一个模式
            if NaiveDate::parse_from_str(&candidate, "%Y-%m-%d").is_ok() {
                return candidate;
            }
        }
    }

    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slash_mdy_formats() {
        assert_eq!(normalize("6/27/2025"), "2025-06-27");
        assert_eq!(normalize("12/31/2024"), "2024-12-31");
        assert_eq!(normalize("1/1/2024"), "2024-01-01");
    }

    #[test]
    fn test_dash_mdy_formats() {
        assert_eq!(normalize("6-27-2025"), "2025-06-27");
        assert_eq!(normalize("06-05-2025"), "2025-06-05");
    }

    #[test]
    fn test_ymd_formats_are_repadded() {
        assert_eq!(normalize("2025/6/27"), "2025-06-27");
        assert_eq!(normalize("2025-6-7"), "2025-06-07");
        assert_eq!(normalize("2025-06-27"), "2025-06-27");
    }

    #[test]
    fn test_invalid_calendar_date_falls_through() {
        // 13 月不是合法的 M/D/YYYY，但 13-01-2024 按 M-D-YYYY 也不合法 → 原样返回
        assert_eq!(normalize("13/01/2024"), "13/01/2024");
        assert_eq!(normalize("2/30/2024"), "2/30/2024");
        // 2024-02-29 是闰日，合法
        assert_eq!(normalize("2/29/2024"), "2024-02-29");
        assert_eq!(normalize("2/29/2023"), "2/29/2023");
    }

    #[test]
    fn test_unrecognized_input_returned_unchanged() {
        assert_eq!(normalize("not-a-date"), "not-a-date");
        assert_eq!(normalize("20250627"), "20250627");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("2025-06-27 10:00:00"), "2025-06-27 10:00:00");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in ["6/27/2025", "2025-6-7", "2025-06-27", "not-a-date", "13/01/2024"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "幂等性被破坏: {}", input);
        }
    }
}
