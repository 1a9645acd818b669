//! ALTO 风格版面文档的提取。只关心 `<Page>` 的页面尺寸和每个
//! `<TextLine>` 的行宽与基线，其余元素一律跳过。

use papyar_core::layout::{Baseline, LineLayout, PageLayout};

use crate::IoError;
use crate::scanner::{XmlEvent, XmlScanner, attribute};

/// 把版面描述解析为 `PageLayout`。
///
/// 页面尺寸缺失或非正、某行缺少四元基线时返回
/// `IoError::MalformedLayout`。行按文档顺序输出，顺序有意义，
/// 下游按下标与转写行配对。
pub fn extract(source: &str) -> Result<PageLayout, IoError> {
    let mut scanner = XmlScanner::new(source);
    let mut page_size: Option<(f64, f64)> = None;
    let mut lines = Vec::new();

    while let Some(event) = scanner
        .next_event()
        .map_err(|err| IoError::MalformedLayout(err.message))?
    {
        let XmlEvent::Start {
            name, attributes, ..
        } = event
        else {
            continue;
        };
        match name {
            // 取第一个 Page 的尺寸，后续 Page 元素忽略。
            "Page" if page_size.is_none() => {
                page_size = Some((
                    required_f64(&attributes, "Page", "WIDTH")?,
                    required_f64(&attributes, "Page", "HEIGHT")?,
                ));
            }
            "TextLine" => {
                let index = lines.len();
                let width = required_f64(&attributes, "TextLine", "WIDTH")?;
                if width <= 0.0 {
                    return Err(IoError::MalformedLayout(format!(
                        "第 {index} 个 TextLine 的 WIDTH 必须为正（值：{width}）"
                    )));
                }
                let baseline = attribute(&attributes, "BASELINE").ok_or_else(|| {
                    IoError::MalformedLayout(format!("第 {index} 个 TextLine 缺少 BASELINE 属性"))
                })?;
                lines.push(LineLayout::from_baseline(
                    width,
                    parse_baseline(baseline, index)?,
                ));
            }
            _ => {}
        }
    }

    let (page_width, page_height) = page_size
        .ok_or_else(|| IoError::MalformedLayout("缺少带 WIDTH/HEIGHT 的 Page 元素".to_string()))?;
    if page_width <= 0.0 || page_height <= 0.0 {
        return Err(IoError::MalformedLayout(format!(
            "页面尺寸必须为正（宽：{page_width}，高：{page_height}）"
        )));
    }
    Ok(PageLayout::new(page_width, page_height, lines))
}

/// 基线属性是空格分隔的坐标序列。ALTO 允许折线基线，这里取前两个
/// 端点；不足四个数值视为不合法。
fn parse_baseline(raw: &str, index: usize) -> Result<Baseline, IoError> {
    let mut values = [0.0f64; 4];
    let mut parts = raw.split_whitespace();
    for slot in &mut values {
        let part = parts.next().ok_or_else(|| {
            IoError::MalformedLayout(format!(
                "第 {index} 个 TextLine 的基线需要至少 4 个数值（值：\"{raw}\"）"
            ))
        })?;
        *slot = part.parse::<f64>().map_err(|_| {
            IoError::MalformedLayout(format!(
                "第 {index} 个 TextLine 的基线数值 \"{part}\" 无法解析"
            ))
        })?;
    }
    Ok(Baseline::new(values[0], values[1], values[2], values[3]))
}

fn required_f64(
    attributes: &[(String, String)],
    element: &str,
    name: &str,
) -> Result<f64, IoError> {
    let raw = attribute(attributes, name).ok_or_else(|| {
        IoError::MalformedLayout(format!("{element} 元素缺少 {name} 属性"))
    })?;
    raw.trim().parse::<f64>().map_err(|_| {
        IoError::MalformedLayout(format!("{element} 的 {name} 值 \"{raw}\" 无法解析"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<alto>
  <Layout>
    <Page WIDTH="1248" HEIGHT="1023" PHYSICAL_IMG_NR="1">
      <PrintSpace>
        <TextBlock ID="b1">
          <TextLine ID="l1" WIDTH="802" BASELINE="381.5 104 1183.5 104"/>
          <TextLine ID="l2" WIDTH="657" BASELINE="77 200 734 196"/>
        </TextBlock>
      </PrintSpace>
    </Page>
  </Layout>
</alto>"#;

    #[test]
    fn extracts_page_and_lines_in_document_order() {
        let page = extract(SAMPLE).expect("extract sample");
        assert!((page.page_width - 1248.0).abs() < f64::EPSILON);
        assert!((page.page_height - 1023.0).abs() < f64::EPSILON);
        assert_eq!(page.lines.len(), 2);
        assert!((page.lines[0].width - 802.0).abs() < f64::EPSILON);
        assert!((page.lines[0].center_x - 782.5).abs() < 1e-12);
        assert!((page.lines[0].center_y - 104.0).abs() < 1e-12);
        assert!(page.lines[0].angle_deg.abs() < 1e-12);
        // the second baseline rises left to right, its tilt is positive
        assert!(page.lines[1].angle_deg > 0.0);
    }

    #[test]
    fn missing_page_dimensions_are_rejected() {
        let err = extract("<alto><Page WIDTH=\"100\"/></alto>").unwrap_err();
        assert!(matches!(err, IoError::MalformedLayout(_)));

        let err = extract("<alto><TextLine WIDTH=\"10\" BASELINE=\"0 0 1 0\"/></alto>").unwrap_err();
        assert!(matches!(err, IoError::MalformedLayout(_)));
    }

    #[test]
    fn non_positive_page_dimensions_are_rejected() {
        let err = extract("<alto><Page WIDTH=\"0\" HEIGHT=\"5\"/></alto>").unwrap_err();
        let IoError::MalformedLayout(message) = err else {
            panic!("expected MalformedLayout");
        };
        assert!(message.contains("必须为正"));
    }

    #[test]
    fn short_baseline_is_rejected() {
        let source = "<alto><Page WIDTH=\"10\" HEIGHT=\"10\"><TextLine WIDTH=\"5\" BASELINE=\"0 0 1\"/></Page></alto>";
        assert!(matches!(
            extract(source).unwrap_err(),
            IoError::MalformedLayout(_)
        ));
    }

    #[test]
    fn polyline_baseline_uses_the_first_two_points() {
        let source = "<alto><Page WIDTH=\"10\" HEIGHT=\"10\"><TextLine WIDTH=\"5\" BASELINE=\"0 4 8 4 9 5\"/></Page></alto>";
        let page = extract(source).expect("extract");
        assert!((page.lines[0].center_x - 4.0).abs() < 1e-12);
        assert!((page.lines[0].center_y - 4.0).abs() < 1e-12);
    }

    #[test]
    fn vertical_baseline_does_not_error() {
        let source = "<alto><Page WIDTH=\"10\" HEIGHT=\"10\"><TextLine WIDTH=\"5\" BASELINE=\"3 0 3 9\"/></Page></alto>";
        let page = extract(source).expect("extract");
        assert!((page.lines[0].angle_deg - 90.0).abs() < 1e-12);
    }
}
