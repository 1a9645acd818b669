//! 手写的 XML 拉取扫描器。语料里的版面与元数据文档只需要起始
//! 标签、属性、文本与结束标签四种事件，不处理 DTD 或命名空间。

#[derive(Debug)]
pub(crate) struct ScanError {
    pub message: String,
}

impl ScanError {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self {
            message: format!("第 {} 行: {}", line, message.into()),
        }
    }
}

#[derive(Debug)]
pub(crate) enum XmlEvent<'a> {
    Start {
        name: &'a str,
        attributes: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: &'a str,
    },
    Text(&'a str),
}

pub(crate) struct XmlScanner<'a> {
    rest: &'a str,
    line: usize,
}

impl<'a> XmlScanner<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            rest: source,
            line: 1,
        }
    }

    /// 返回下一个事件，文档结束时返回 `None`。注释、处理指令与
    /// `<!...>` 声明被跳过。
    pub(crate) fn next_event(&mut self) -> Result<Option<XmlEvent<'a>>, ScanError> {
        loop {
            let rest = self.rest;
            if rest.is_empty() {
                return Ok(None);
            }

            if !rest.starts_with('<') {
                // 纯空白的文本节点也要上报，textContent 语义依赖
                // 元素之间的换行。
                let end = rest.find('<').unwrap_or(rest.len());
                let (text, remainder) = rest.split_at(end);
                self.advance_to(remainder, text);
                return Ok(Some(XmlEvent::Text(text)));
            }

            if let Some(stripped) = rest.strip_prefix("<!--") {
                let close = stripped
                    .find("-->")
                    .ok_or_else(|| ScanError::at(self.line, "注释没有对应的 \"-->\" 结束符"))?;
                self.advance_to(&stripped[close + 3..], &rest[..4 + close + 3]);
                continue;
            }

            if rest.starts_with("<?") || rest.starts_with("<!") {
                let close = rest
                    .find('>')
                    .ok_or_else(|| ScanError::at(self.line, "声明没有对应的 \">\" 结束符"))?;
                let (consumed, remainder) = rest.split_at(close + 1);
                self.advance_to(remainder, consumed);
                continue;
            }

            let close = rest
                .find('>')
                .ok_or_else(|| ScanError::at(self.line, "标签没有对应的 \">\" 结束符"))?;
            let tag = &rest[1..close];
            let line = self.line;
            self.advance_to(&rest[close + 1..], &rest[..close + 1]);

            if let Some(name) = tag.strip_prefix('/') {
                return Ok(Some(XmlEvent::End { name: name.trim() }));
            }

            let (body, self_closing) = match tag.strip_suffix('/') {
                Some(body) => (body, true),
                None => (tag, false),
            };
            let name_end = body
                .find(|ch: char| ch.is_whitespace())
                .unwrap_or(body.len());
            let name = &body[..name_end];
            if name.is_empty() {
                return Err(ScanError::at(line, "标签缺少名称"));
            }
            let attributes = parse_attributes(&body[name_end..], line)?;
            return Ok(Some(XmlEvent::Start {
                name,
                attributes,
                self_closing,
            }));
        }
    }

    fn advance_to(&mut self, remainder: &'a str, consumed: &str) {
        self.line += consumed.matches('\n').count();
        self.rest = remainder;
    }
}

fn parse_attributes(raw: &str, line: usize) -> Result<Vec<(String, String)>, ScanError> {
    let mut attributes = Vec::new();
    let mut rest = raw.trim_start();
    while !rest.is_empty() {
        let name_end = rest
            .find(|ch: char| ch.is_whitespace() || ch == '=')
            .ok_or_else(|| ScanError::at(line, format!("属性 \"{rest}\" 缺少值")))?;
        let name = &rest[..name_end];
        rest = rest[name_end..].trim_start();
        let Some(stripped) = rest.strip_prefix('=') else {
            return Err(ScanError::at(line, format!("属性 \"{name}\" 缺少 \"=\"")));
        };
        rest = stripped.trim_start();
        let quote = rest.chars().next().filter(|ch| *ch == '"' || *ch == '\'');
        let Some(quote) = quote else {
            return Err(ScanError::at(line, format!("属性 \"{name}\" 的值缺少引号")));
        };
        let value_body = &rest[1..];
        let value_end = value_body
            .find(quote)
            .ok_or_else(|| ScanError::at(line, format!("属性 \"{name}\" 的值没有闭合")))?;
        attributes.push((
            name.to_string(),
            decode_entities(&value_body[..value_end]),
        ));
        rest = value_body[value_end + 1..].trim_start();
    }
    Ok(attributes)
}

/// 解码最常见的五个预定义实体，其余序列原样保留。
pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut result = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(position) = rest.find('&') {
        result.push_str(&rest[..position]);
        rest = &rest[position..];
        let replaced = [
            ("&amp;", "&"),
            ("&lt;", "<"),
            ("&gt;", ">"),
            ("&quot;", "\""),
            ("&apos;", "'"),
        ]
        .iter()
        .find_map(|(entity, text)| rest.strip_prefix(entity).map(|tail| (tail, *text)));
        match replaced {
            Some((tail, text)) => {
                result.push_str(text);
                rest = tail;
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

pub(crate) fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

/// 收集文档顺序中名为 `name` 的元素的全部文本内容（含后代文本，
/// 即 textContent 语义）。`attribute_filter` 限定必须携带的属性值，
/// `max` 限制收集数量，0 表示不限。
pub(crate) fn element_texts(
    source: &str,
    name: &str,
    attribute_filter: Option<(&str, &str)>,
    max: usize,
) -> Result<Vec<String>, ScanError> {
    let mut scanner = XmlScanner::new(source);
    let mut results = Vec::new();
    let mut depth = 0usize;
    let mut capture_depth: Option<usize> = None;
    let mut buffer = String::new();

    while let Some(event) = scanner.next_event()? {
        match event {
            XmlEvent::Start {
                name: tag,
                attributes,
                self_closing,
            } => {
                if self_closing {
                    continue;
                }
                depth += 1;
                if capture_depth.is_none() && tag == name {
                    let matches = attribute_filter
                        .map(|(key, value)| attribute(&attributes, key) == Some(value))
                        .unwrap_or(true);
                    if matches {
                        capture_depth = Some(depth);
                        buffer.clear();
                    }
                }
            }
            XmlEvent::End { name: tag } => {
                if capture_depth == Some(depth) && tag == name {
                    results.push(buffer.clone());
                    capture_depth = None;
                    if max != 0 && results.len() == max {
                        break;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            XmlEvent::Text(text) => {
                if capture_depth.is_some() {
                    buffer.push_str(&decode_entities(text));
                }
            }
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_tags_attributes_and_text() {
        let mut scanner = XmlScanner::new("<a x=\"1\"><b/>hi</a>");
        match scanner.next_event().unwrap().unwrap() {
            XmlEvent::Start {
                name,
                attributes,
                self_closing,
            } => {
                assert_eq!(name, "a");
                assert_eq!(attribute(&attributes, "x"), Some("1"));
                assert!(!self_closing);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            scanner.next_event().unwrap().unwrap(),
            XmlEvent::Start {
                self_closing: true,
                ..
            }
        ));
        assert!(matches!(
            scanner.next_event().unwrap().unwrap(),
            XmlEvent::Text("hi")
        ));
        assert!(matches!(
            scanner.next_event().unwrap().unwrap(),
            XmlEvent::End { name: "a" }
        ));
        assert!(scanner.next_event().unwrap().is_none());
    }

    #[test]
    fn skips_prolog_and_comments() {
        let source = "<?xml version=\"1.0\"?><!-- note --><root>x</root>";
        let mut scanner = XmlScanner::new(source);
        assert!(matches!(
            scanner.next_event().unwrap().unwrap(),
            XmlEvent::Start { name: "root", .. }
        ));
    }

    #[test]
    fn unterminated_tag_is_reported_with_line() {
        let mut scanner = XmlScanner::new("<root>\n<bad");
        scanner.next_event().unwrap();
        assert!(matches!(
            scanner.next_event().unwrap().unwrap(),
            XmlEvent::Text("\n")
        ));
        let err = scanner.next_event().unwrap_err();
        assert!(err.message.contains("第 2 行"));
    }

    #[test]
    fn element_texts_concatenates_descendants() {
        let source = "<doc><div>alpha <hi>beta</hi>\ngamma</div><div>second</div></doc>";
        let texts = element_texts(source, "div", None, 1).unwrap();
        assert_eq!(texts, vec!["alpha beta\ngamma".to_string()]);

        let all = element_texts(source, "div", None, 0).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[1], "second");
    }

    #[test]
    fn element_texts_honours_attribute_filter() {
        let source = "<x><idno type=\"TM\">2033</idno><idno type=\"ddb-hybrid\">p.abc;1;2</idno></x>";
        let texts = element_texts(source, "idno", Some(("type", "ddb-hybrid")), 1).unwrap();
        assert_eq!(texts, vec!["p.abc;1;2".to_string()]);
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
        assert_eq!(decode_entities("plain"), "plain");
        assert_eq!(decode_entities("&unknown; stays"), "&unknown; stays");
    }
}
