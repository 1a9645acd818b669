//! 页面令牌的编解码。令牌是二维码与 AR 页面之间的线上格式：
//! `metaId_pageWidth_pageHeight_width!centerX!centerY!angle_...`，
//! 段之间用 `_`，行内字段用 `!`。历史上另一批生成器用 `|` 作行内
//! 分隔符，解码两者都接受，编码统一输出 `!`。

use papyar_core::layout::{LineLayout, PageLayout};
use serde::{Deserialize, Serialize};

use crate::IoError;

/// 解码后的页面令牌：元数据标识符加可选的整页版面。只有标识符
/// 的令牌是合法的，表示该页没有可用的行版面。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageToken {
    pub meta_id: String,
    pub page: Option<PageLayout>,
}

pub fn decode_page_token(token: &str) -> Result<PageToken, IoError> {
    let mut segments = token.split('_');
    let meta_id = segments.next().unwrap_or_default();
    if meta_id.is_empty() {
        return Err(IoError::MalformedToken(
            "令牌缺少元数据标识符".to_string(),
        ));
    }
    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        return Ok(PageToken {
            meta_id: meta_id.to_string(),
            page: None,
        });
    }
    if rest.len() < 2 {
        return Err(IoError::MalformedToken(
            "令牌缺少页面宽度或高度".to_string(),
        ));
    }

    let page_width = parse_field(rest[0], "页面宽度")?;
    let page_height = parse_field(rest[1], "页面高度")?;
    if page_width <= 0.0 || page_height <= 0.0 {
        return Err(IoError::MalformedToken(format!(
            "页面尺寸必须为正（宽：{page_width}，高：{page_height}）"
        )));
    }

    let mut lines = Vec::with_capacity(rest.len() - 2);
    for (index, segment) in rest[2..].iter().enumerate() {
        let fields: Vec<&str> = segment.split(['!', '|']).collect();
        if fields.len() != 4 {
            return Err(IoError::MalformedToken(format!(
                "第 {index} 个行段需要 4 个字段（值：\"{segment}\"）"
            )));
        }
        lines.push(LineLayout {
            width: parse_field(fields[0], "行宽")?,
            center_x: parse_field(fields[1], "行中心 x")?,
            center_y: parse_field(fields[2], "行中心 y")?,
            angle_deg: parse_field(fields[3], "行倾角")?,
        });
    }

    Ok(PageToken {
        meta_id: meta_id.to_string(),
        page: Some(PageLayout::new(page_width, page_height, lines)),
    })
}

/// `decode_page_token` 的逆操作，总是输出规范分隔符。
pub fn encode_page_token(token: &PageToken) -> String {
    let Some(page) = &token.page else {
        return token.meta_id.clone();
    };
    let mut encoded = format!("{}_{}_{}", token.meta_id, page.page_width, page.page_height);
    for line in &page.lines {
        encoded.push('_');
        encoded.push_str(&format!(
            "{}!{}!{}!{}",
            line.width, line.center_x, line.center_y, line.angle_deg
        ));
    }
    encoded
}

/// 拼出 AR 页面的分享链接，二维码工具只消费这个字符串。
pub fn overlay_url(base: &str, token: &PageToken) -> String {
    format!("{}?page={}", base.trim_end_matches('/'), encode_page_token(token))
}

fn parse_field(raw: &str, context: &str) -> Result<f64, IoError> {
    let value = raw.trim().parse::<f64>().map_err(|_| {
        IoError::MalformedToken(format!("{context}的值 \"{raw}\" 无法解析"))
    })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(IoError::MalformedToken(format!(
            "{context}的值 \"{raw}\" 不是有限数"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_token_round_trips() {
        let token = decode_page_token("2033_795_1063_1063!401.5!104!0.68_657!405.5!198!0.7")
            .expect("decode");
        assert_eq!(token.meta_id, "2033");
        let page = token.page.as_ref().expect("page layout");
        assert!((page.page_width - 795.0).abs() < f64::EPSILON);
        assert!((page.page_height - 1063.0).abs() < f64::EPSILON);
        assert_eq!(page.lines.len(), 2);
        assert!((page.lines[1].center_x - 405.5).abs() < f64::EPSILON);
        assert!((page.lines[1].angle_deg - 0.7).abs() < f64::EPSILON);

        let encoded = encode_page_token(&token);
        assert_eq!(decode_page_token(&encoded).expect("re-decode"), token);
    }

    #[test]
    fn pipe_separated_fields_are_accepted() {
        let token = decode_page_token("2033_795_1063_1063|401.5|104|0.68").expect("decode");
        let page = token.page.expect("page layout");
        assert!((page.lines[0].width - 1063.0).abs() < f64::EPSILON);
        // encoding normalizes back to the bang separator
        let encoded = encode_page_token(&PageToken {
            meta_id: "2033".to_string(),
            page: Some(page),
        });
        assert!(encoded.contains('!'));
        assert!(!encoded.contains('|'));
    }

    #[test]
    fn bare_identifier_is_a_meta_only_token() {
        let token = decode_page_token("2033").expect("decode");
        assert_eq!(token.meta_id, "2033");
        assert!(token.page.is_none());
        assert_eq!(encode_page_token(&token), "2033");
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        assert!(matches!(
            decode_page_token("").unwrap_err(),
            IoError::MalformedToken(_)
        ));
        assert!(matches!(
            decode_page_token("2033_795").unwrap_err(),
            IoError::MalformedToken(_)
        ));
        assert!(matches!(
            decode_page_token("2033_0_1063").unwrap_err(),
            IoError::MalformedToken(_)
        ));
        assert!(matches!(
            decode_page_token("2033_795_1063_1!2!3").unwrap_err(),
            IoError::MalformedToken(_)
        ));
        assert!(matches!(
            decode_page_token("2033_795_1063_a!2!3!4").unwrap_err(),
            IoError::MalformedToken(_)
        ));
    }

    #[test]
    fn overlay_url_appends_the_page_parameter() {
        let token = decode_page_token("2033").expect("decode");
        assert_eq!(
            overlay_url("https://example.org/ar/", &token),
            "https://example.org/ar?page=2033"
        );
    }
}
