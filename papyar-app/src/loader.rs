use std::env;
use std::fs;
use std::path::PathBuf;

use papyar_core::layout::{Baseline, LineLayout, PageLayout};
use papyar_engine::scene::{SceneDocument, TranscriptionSet};
use papyar_io::token::{PageToken, decode_page_token};
use papyar_io::{AltoFacade, LayoutLoader};
use tracing::{info, warn};

/// 文档来源，便于演示输出加载信息。
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Alto(PathBuf),
    Token(String),
    Demo,
}

/// 封装加载后的场景文档与元信息。
#[derive(Debug)]
pub struct LoadedDocument {
    pub document: SceneDocument,
    pub source: DocumentSource,
    pub token: PageToken,
}

/// 按优先级组装会话文档：`--layout` 指定的 ALTO 文件、环境变量
/// `PAPYAR_SAMPLE_ALTO`、`--page` 传入的页面令牌，都失败或缺席时
/// 回退到内置示例。转写文本来自 `--transcription` 指定的纯文本
/// 文件（每行一条），缺省时使用示例转写。抓取远端 XML 属于外部
/// 协作方，这里不做网络访问。
pub fn load_document(
    page_token: Option<&str>,
    layout_path: Option<&PathBuf>,
    transcription_path: Option<&PathBuf>,
) -> LoadedDocument {
    let transcription_lines = transcription_path.map_or_else(demo_transcription, |path| {
        match fs::read_to_string(path) {
            Ok(content) => content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "读取转写文件失败，使用示例转写");
                demo_transcription()
            }
        }
    });

    if let Some(path) = layout_path
        .cloned()
        .or_else(|| env::var_os("PAPYAR_SAMPLE_ALTO").map(PathBuf::from))
    {
        let loader = AltoFacade::new();
        match loader.load(&path) {
            Ok(page) => {
                info!(path = %path.display(), line_count = page.lines.len(), "从 ALTO 文件加载版面成功");
                return assemble(
                    page,
                    transcription_lines,
                    DocumentSource::Alto(path),
                );
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "加载 ALTO 版面失败，回退到其他来源");
            }
        }
    }

    if let Some(raw) = page_token {
        match decode_page_token(raw) {
            Ok(token) => {
                info!(meta_id = %token.meta_id, "从页面令牌加载版面成功");
                let page = token.page.clone().unwrap_or_else(demo_page);
                let mut loaded =
                    assemble(page, transcription_lines, DocumentSource::Token(raw.to_string()));
                loaded.token = token;
                return loaded;
            }
            Err(err) => {
                warn!(error = %err, "解析页面令牌失败，回退到内置示例");
            }
        }
    }

    assemble(demo_page(), transcription_lines, DocumentSource::Demo)
}

fn assemble(
    page: PageLayout,
    lines: Vec<String>,
    source: DocumentSource,
) -> LoadedDocument {
    let token = PageToken {
        meta_id: DEMO_META_ID.to_string(),
        page: Some(page.clone()),
    };
    LoadedDocument {
        document: SceneDocument {
            metadata: demo_metadata(),
            transcription: Some(TranscriptionSet { page, lines }),
        },
        source,
        token,
    }
}

const DEMO_META_ID: &str = "2033";

/// 内置示例：BGU IV 1204（Trismegistos 2033）的节选。
fn demo_metadata() -> Vec<(String, String)> {
    vec![
        (
            "title".to_string(),
            "Brief des Asklepiades an seine Mutter".to_string(),
        ),
        ("material".to_string(), "Papyrus".to_string()),
        ("originalPlace".to_string(), "Alexandria".to_string()),
        ("originalDate".to_string(), "28 v.Chr.".to_string()),
        ("subjects".to_string(), "Brief (privat) | Familie".to_string()),
    ]
}

fn demo_page() -> PageLayout {
    PageLayout::new(
        1248.0,
        1023.0,
        vec![
            LineLayout::from_baseline(802.0, Baseline::new(381.5, 104.0, 1183.5, 104.0)),
            LineLayout::from_baseline(657.0, Baseline::new(77.0, 200.0, 734.0, 196.0)),
            LineLayout::from_baseline(710.0, Baseline::new(81.0, 291.0, 791.0, 286.0)),
            LineLayout::from_baseline(423.0, Baseline::new(79.0, 385.0, 502.0, 383.0)),
        ],
    )
}

fn demo_transcription() -> Vec<String> {
    vec![
        "Ἀσκληπιάδης Ἰσιδώρᾳ τῇ μητρὶ χαίρειν".to_string(),
        "καὶ διὰ παντὸς ὑγιαίνειν εὔχομαι".to_string(),
        "κομισάμενός σου τὴν ἐπιστολὴν".to_string(),
        "ἔρρωσο".to_string(),
    ]
}
