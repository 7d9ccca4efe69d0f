//! 최소 PDF 1.4 인코더
//!
//! [`DocumentLayout`]의 각 페이지를 US Letter 크기의 PDF 페이지 하나로 씁니다.
//! 표준 14 폰트(Courier, Courier-Bold)만 사용하므로 폰트 임베딩이 필요 없습니다.
//!
//! 텍스트는 `/WinAnsiEncoding`으로 씁니다. Latin-1 문자는 8진 이스케이프로
//! 그대로 표시되고, 인코딩에 없는 문자는 `<U+XXXX>` 형태로 남겨 내용이
//! 사라지지 않게 합니다.
//!
//! # 객체 구성
//!
//! ```text
//! 1: Catalog   2: Pages   3: F1 Courier   4: F2 Courier-Bold   5: Info
//! 6 + 2i: Page i         7 + 2i: Content stream of page i
//! ```
//!
//! 같은 레이아웃이면 항상 같은 바이트를 생성합니다 (생성 시각을 기록하지 않음).

use super::document::{DocumentLayout, LineStyle};

const PAGE_WIDTH: f64 = 612.0;
const PAGE_HEIGHT: f64 = 792.0;
const MARGIN: f64 = 54.0;
const FOOTER_Y: f64 = 30.0;
const FOOTER_FONT_SIZE: f64 = 8.0;
const MAX_FONT_SIZE: f64 = 10.0;
/// Courier 글리프 폭 (em 대비)
const COURIER_ADVANCE: f64 = 0.6;
/// 이어지는 줄 들여쓰기 (문자 수)
const CONTINUATION_INDENT: usize = 2;

const FIRST_PAGE_OBJECT: usize = 6;

/// WinAnsiEncoding에서 Latin-1과 다른 0x80-0x9F 영역
const WIN_ANSI_HIGH: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

const TAB_WIDTH: usize = 4;

/// 문자의 WinAnsiEncoding 코드. 인코딩에 없으면 `None`.
fn win_ansi_byte(c: char) -> Option<u8> {
    match c {
        ' '..='~' | '\u{A0}'..='\u{FF}' => u8::try_from(u32::from(c)).ok(),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(ch, _)| *ch == c)
            .map(|(_, byte)| *byte),
    }
}

fn codepoint_marker(c: char) -> String {
    format!("<U+{:04X}>", u32::from(c))
}

/// PDF 문자열 리터럴용으로 텍스트를 이스케이프합니다.
///
/// 탭은 공백 네 개로 바꿉니다. ASCII 밖의 WinAnsi 문자는 `\ddd` 8진 이스케이프,
/// 인코딩에 없는 문자와 제어 문자는 `<U+XXXX>`로 씁니다. 결과는 항상 ASCII입니다.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\t' => out.push_str(&" ".repeat(TAB_WIDTH)),
            c => match win_ansi_byte(c) {
                Some(byte) if byte.is_ascii() => out.push(char::from(byte)),
                Some(byte) => out.push_str(&format!("\\{byte:03o}")),
                None => out.push_str(&codepoint_marker(c)),
            },
        }
    }
    out
}

/// 페이지에 그려질 때 텍스트가 차지하는 글자 칸 수
pub fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c {
            '\t' => TAB_WIDTH,
            c if win_ansi_byte(c).is_some() => 1,
            c => codepoint_marker(c).len(),
        })
        .sum()
}

fn indent_for(style: LineStyle) -> usize {
    match style {
        LineStyle::Continuation => CONTINUATION_INDENT,
        _ => 0,
    }
}

struct Metrics {
    leading: f64,
    font_size: f64,
}

impl Metrics {
    fn for_layout(layout: &DocumentLayout) -> Self {
        let leading = (PAGE_HEIGHT - 2.0 * MARGIN) / layout.page_lines() as f64;
        // 탭과 `<U+XXXX>` 표기는 한 글자보다 넓으므로 실제 폭으로 글꼴 크기를 정합니다.
        let widest = layout
            .pages()
            .iter()
            .flat_map(|page| page.lines())
            .map(|line| indent_for(line.style) + display_width(&line.text))
            .max()
            .unwrap_or(0);
        let columns = widest.max(layout.line_width() + CONTINUATION_INDENT) as f64;
        let by_width = (PAGE_WIDTH - 2.0 * MARGIN) / (columns * COURIER_ADVANCE);
        let font_size = MAX_FONT_SIZE.min(leading * 0.9).min(by_width);
        Self { leading, font_size }
    }
}

fn content_stream(
    layout: &DocumentLayout,
    page_index: usize,
    metrics: &Metrics,
) -> String {
    let mut content = String::new();
    let Some(page) = layout.pages().get(page_index) else {
        return content;
    };

    for (row, line) in page.lines().iter().enumerate() {
        if line.style == LineStyle::Blank || line.text.is_empty() {
            continue;
        }
        let font = match line.style {
            LineStyle::Title | LineStyle::Heading => "F2",
            _ => "F1",
        };
        let x = MARGIN + indent_for(line.style) as f64 * metrics.font_size * COURIER_ADVANCE;
        let y = PAGE_HEIGHT - MARGIN - metrics.leading * (row as f64 + 1.0) + metrics.leading * 0.2;
        content.push_str(&format!(
            "BT\n/{font} {:.2} Tf\n{x:.2} {y:.2} Td\n({}) Tj\nET\n",
            metrics.font_size,
            escape_text(&line.text)
        ));
    }

    content.push_str(&format!(
        "BT\n/F1 {FOOTER_FONT_SIZE:.2} Tf\n{MARGIN:.2} {FOOTER_Y:.2} Td\n(Page {} of {}) Tj\nET\n",
        page_index + 1,
        layout.page_count()
    ));
    content
}

/// 레이아웃을 PDF 문서 바이트로 인코딩합니다.
pub fn encode(layout: &DocumentLayout, title: &str) -> Vec<u8> {
    let metrics = Metrics::for_layout(layout);
    let page_count = layout.page_count();

    let kids = (0..page_count)
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJECT + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {page_count} >>").into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Courier-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        format!(
            "<< /Title ({}) /Producer (dockaudit) >>",
            escape_text(title)
        )
        .into_bytes(),
    ];

    for i in 0..page_count {
        let content_id = FIRST_PAGE_OBJECT + 2 * i + 1;
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {PAGE_WIDTH:.0} {PAGE_HEIGHT:.0}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {content_id} 0 R >>"
            )
            .into_bytes(),
        );

        let content = content_stream(layout, i, &metrics);
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::document::paginate;
    use crate::report::aggregate_at;
    use chrono::{TimeZone, Utc};
    use dockaudit_core::types::{ContainerDescriptor, ProbeKind, ProbeResult};

    fn layout(findings: usize, page_lines: usize) -> DocumentLayout {
        let container = ContainerDescriptor::new("abc123", "api", "python:3.12").unwrap();
        let lines = (0..findings).map(|i| format!("/app/conf/{i}.yml")).collect();
        let report = aggregate_at(
            &container,
            vec![ProbeResult::new(ProbeKind::ConfigFiles, lines)],
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        );
        paginate(&report, page_lines, 100)
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|w| *w == needle)
            .count()
    }

    #[test]
    fn escape_text_handles_special_characters() {
        assert_eq!(escape_text("a(b)c\\d"), "a\\(b\\)c\\\\d");
        assert_eq!(escape_text("200M\t/data"), "200M    /data");
        assert_eq!(escape_text("café"), "caf\\351");
        assert_eq!(escape_text("\u{20AC}5"), "\\2005");
        assert_eq!(escape_text("日"), "<U+65E5>");
        assert_eq!(escape_text("a\u{7}b"), "a<U+0007>b");
    }

    #[test]
    fn display_width_counts_rendered_columns() {
        assert_eq!(display_width("café"), 4);
        assert_eq!(display_width("a\tb"), 6);
        assert_eq!(display_width("日本"), 16);
    }

    /// `(...) Tj` 문자열을 WinAnsi 바이트에서 다시 문자로 복원합니다.
    fn decode_shown_text(pdf: &[u8]) -> Vec<String> {
        let text = std::str::from_utf8(pdf).expect("encoder output is ASCII");
        text.lines()
            .filter_map(|line| line.strip_prefix('(')?.strip_suffix(") Tj"))
            .map(|literal| {
                let mut out = String::new();
                let mut chars = literal.chars();
                while let Some(c) = chars.next() {
                    if c != '\\' {
                        out.push(c);
                        continue;
                    }
                    let next = chars.next().unwrap();
                    if !next.is_ascii_digit() {
                        out.push(next);
                        continue;
                    }
                    let octal: String = [next, chars.next().unwrap(), chars.next().unwrap()]
                        .into_iter()
                        .collect();
                    let byte = u8::from_str_radix(&octal, 8).unwrap();
                    let decoded = WIN_ANSI_HIGH
                        .iter()
                        .find(|(_, b)| *b == byte)
                        .map(|(ch, _)| *ch)
                        .unwrap_or(char::from(byte));
                    out.push(decoded);
                }
                out
            })
            .collect()
    }

    #[test]
    fn non_ascii_findings_survive_into_pdf_text() {
        let container = ContainerDescriptor::new("abc123", "café-api", "python:3.12").unwrap();
        let findings = vec![
            "8.0K\t/data/café.db".to_owned(),
            "16K\t/srv/naïve/Ærø.sqlite".to_owned(),
            "4.0K\t/opt/\u{20AC}uro.mdb".to_owned(),
        ];
        let report = aggregate_at(
            &container,
            vec![ProbeResult::new(ProbeKind::DatabaseFiles, findings.clone())],
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        );
        let bytes = encode(&paginate(&report, 60, 100), "Container Report: café-api");
        let shown = decode_shown_text(&bytes);

        for finding in &findings {
            let expected = finding.replace('\t', "    ");
            assert!(shown.contains(&expected), "missing {expected:?} in {shown:?}");
        }
        assert!(shown.contains(&"Container Report: café-api".to_owned()));
        assert!(!shown.iter().any(|line| line.contains('?')));
        assert_eq!(count(&bytes, b"/Encoding /WinAnsiEncoding"), 2);
    }

    #[test]
    fn characters_outside_win_ansi_are_kept_as_codepoints() {
        let container = ContainerDescriptor::new("abc123", "api", "python:3.12").unwrap();
        let report = aggregate_at(
            &container,
            vec![ProbeResult::new(
                ProbeKind::ConfigFiles,
                vec!["/etc/日本.conf".to_owned()],
            )],
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        );
        let shown = decode_shown_text(&encode(&paginate(&report, 60, 100), "t"));
        assert!(shown.contains(&"/etc/<U+65E5><U+672C>.conf".to_owned()));
    }

    #[test]
    fn encode_produces_valid_envelope() {
        let bytes = encode(&layout(3, 60), "Container Report: api");
        assert!(bytes.starts_with(b"%PDF-1.4\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(count(&bytes, b"/Type /Page /Parent"), 1);
        assert_eq!(count(&bytes, b"/Count 1 "), 1);
    }

    #[test]
    fn one_pdf_page_per_layout_page() {
        let layout = layout(200, 30);
        let bytes = encode(&layout, "t");
        assert!(layout.page_count() > 1);
        assert_eq!(count(&bytes, b"/Type /Page /Parent"), layout.page_count());
        let footer = format!("(Page {0} of {0}) Tj", layout.page_count());
        assert_eq!(count(&bytes, footer.as_bytes()), 1);
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = encode(&layout(5, 60), "t");
        let text = String::from_utf8_lossy(&bytes);
        let xref_start = text.find("xref\n").unwrap();
        let entries: Vec<usize> = text[xref_start..]
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().unwrap())
            .collect();

        assert_eq!(entries.len(), 5 + 2);
        for (i, offset) in entries.iter().enumerate() {
            let expected = format!("{} 0 obj", i + 1);
            assert!(bytes[*offset..].starts_with(expected.as_bytes()));
        }
    }

    #[test]
    fn stream_length_matches_content() {
        let bytes = encode(&layout(1, 60), "t");
        let text = String::from_utf8_lossy(&bytes);
        let start = text.find("/Length ").unwrap() + "/Length ".len();
        let end = start + text[start..].find(' ').unwrap();
        let length: usize = text[start..end].parse().unwrap();
        let body_start = start + text[start..].find("stream\n").unwrap() + "stream\n".len();
        assert_eq!(&text[body_start + length..body_start + length + 10], "\nendstream");
    }

    #[test]
    fn encoding_is_deterministic() {
        let l = layout(20, 60);
        assert_eq!(encode(&l, "t"), encode(&l, "t"));
    }
}
