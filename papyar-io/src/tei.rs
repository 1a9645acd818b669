//! TEI 元数据与 DDB 转写文档的字段提取。抓取元数据面板展示的
//! 五个字段：标题、材质、出土地、年代与主题词。

use crate::IoError;
use crate::scanner::element_texts;

/// 主题词之间的展示分隔符。
const SUBJECT_SEPARATOR: &str = " | ";

/// 从元数据 XML 提取展示用的键值对。缺失的元素产出空字符串而
/// 不是错误，残缺的元数据文件在实际语料中很常见。
pub fn extract_metadata(source: &str) -> Result<Vec<(String, String)>, IoError> {
    let title = first_text(source, "title")?;
    let material = first_text(source, "material")?;
    let orig_place = first_text(source, "origPlace")?;
    let orig_date = first_text(source, "origDate")?;
    let subjects = element_texts(source, "term", None, 0)
        .map_err(|err| IoError::MalformedDocument(err.message))?
        .iter()
        .map(|term| term.trim().to_string())
        .collect::<Vec<_>>()
        .join(SUBJECT_SEPARATOR);

    Ok(vec![
        ("title".to_string(), title),
        ("material".to_string(), material),
        ("originalPlace".to_string(), orig_place),
        ("originalDate".to_string(), orig_date),
        ("subjects".to_string(), subjects),
    ])
}

/// 转写正文：第一个 `<div>` 元素的全部文本，按行拆开，逐行去除
/// 首尾空白并丢弃空行。
pub fn extract_transcription(source: &str) -> Result<Vec<String>, IoError> {
    let divs = element_texts(source, "div", None, 1)
        .map_err(|err| IoError::MalformedDocument(err.message))?;
    let Some(body) = divs.into_iter().next() else {
        return Ok(Vec::new());
    };
    Ok(body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// 元数据文件里指向 DDB 转写的标识符（`<idno type="ddb-hybrid">`）。
pub fn ddb_identifier(source: &str) -> Result<Option<String>, IoError> {
    let matches = element_texts(source, "idno", Some(("type", "ddb-hybrid")), 1)
        .map_err(|err| IoError::MalformedDocument(err.message))?;
    Ok(matches.into_iter().next().map(|id| id.trim().to_string()))
}

fn first_text(source: &str, name: &str) -> Result<String, IoError> {
    let texts = element_texts(source, name, None, 1)
        .map_err(|err| IoError::MalformedDocument(err.message))?;
    Ok(texts
        .into_iter()
        .next()
        .map(|text| text.trim().to_string())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    const META: &str = r#"<TEI>
  <teiHeader>
    <fileDesc>
      <titleStmt><title>Brief des Asklepiades</title></titleStmt>
      <publicationStmt>
        <idno type="TM">2033</idno>
        <idno type="ddb-hybrid">bgu;4;1204</idno>
      </publicationStmt>
    </fileDesc>
    <physDesc><objectDesc><supportDesc><support>
      <material>Papyrus</material>
    </support></supportDesc></objectDesc></physDesc>
    <history><origin>
      <origPlace>Alexandria</origPlace>
      <origDate notBefore="-0028" notAfter="-0028">28 v.Chr.</origDate>
    </origin></history>
    <textClass>
      <keywords>
        <term>Brief</term>
        <term>privat</term>
      </keywords>
    </textClass>
  </teiHeader>
</TEI>"#;

    #[test]
    fn metadata_fields_keep_display_order() {
        let fields = extract_metadata(META).expect("extract metadata");
        let keys: Vec<&str> = fields.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["title", "material", "originalPlace", "originalDate", "subjects"]
        );
        assert_eq!(fields[0].1, "Brief des Asklepiades");
        assert_eq!(fields[1].1, "Papyrus");
        assert_eq!(fields[2].1, "Alexandria");
        assert_eq!(fields[3].1, "28 v.Chr.");
        assert_eq!(fields[4].1, "Brief | privat");
    }

    #[test]
    fn missing_fields_become_empty_strings() {
        let fields = extract_metadata("<TEI><title>only</title></TEI>").expect("extract");
        assert_eq!(fields[0].1, "only");
        assert_eq!(fields[1].1, "");
        assert_eq!(fields[4].1, "");
    }

    #[test]
    fn transcription_lines_are_trimmed_and_filtered() {
        let source = "<TEI><body><div>\n  πρώτη γραμμή\n\n  <lb/>δεύτερη\n   </div><div>ignored</div></body></TEI>";
        let lines = extract_transcription(source).expect("extract");
        assert_eq!(lines, vec!["πρώτη γραμμή".to_string(), "δεύτερη".to_string()]);
    }

    #[test]
    fn transcription_without_div_is_empty() {
        assert!(extract_transcription("<TEI><body/></TEI>")
            .expect("extract")
            .is_empty());
    }

    #[test]
    fn ddb_identifier_matches_the_typed_idno() {
        assert_eq!(
            ddb_identifier(META).expect("extract"),
            Some("bgu;4;1204".to_string())
        );
        assert_eq!(ddb_identifier("<TEI/>").expect("extract"), None);
    }
}
