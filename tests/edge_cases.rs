//! Edge case tests for kakaopack
//!
//! Boundary conditions of the line scanner, the time normalizer and the
//! tabular fallback that are awkward to cover in unit tests.

use chrono::{Local, NaiveDate, NaiveTime, Timelike};
use kakaopack::config::{ContinuationPolicy, DateFallback, ParserConfig};
use kakaopack::parser::KakaoParser;
use kakaopack::parsing::line::{LineKind, classify_line};
use kakaopack::parsing::timestamp::{parse_time_token, sentinel_time};

fn lenient() -> ParserConfig {
    ParserConfig::new().with_min_line_rows(1)
}

// =========================================================================
// Time tokens
// =========================================================================

#[test]
fn test_twelve_oclock_boundaries() {
    let t = |s| parse_time_token(s).unwrap();
    assert_eq!(t("오전 12:00"), NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    assert_eq!(t("오전 12:59"), NaiveTime::from_hms_opt(0, 59, 0).unwrap());
    assert_eq!(t("오후 12:00"), NaiveTime::from_hms_opt(12, 0, 0).unwrap());
    assert_eq!(t("오후 11:59"), NaiveTime::from_hms_opt(23, 59, 0).unwrap());
}

#[test]
fn test_malformed_time_gets_sentinel() {
    let export = "2024년 1월 20일 토요일\n오후 25:99, 철수 : 이상한 시간\n오후 4:26, 영희 : 정상\n";
    let table = KakaoParser::with_config(lenient()).parse_str(export).unwrap();

    assert_eq!(table.len(), 2);
    assert_eq!(table.report().sentinel_count, 1);
    let odd = table.iter().find(|m| m.author == "철수").unwrap();
    assert_eq!(odd.timestamp.time(), sentinel_time());
    assert_eq!(odd.timestamp.date(), NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
}

#[test]
fn test_impossible_date_header_is_noise() {
    assert_eq!(classify_line("2024년 2월 30일 금요일"), LineKind::Noise);
    assert!(matches!(
        classify_line("2024년 2월 29일 목요일"),
        LineKind::DateHeader(_)
    ));
}

// =========================================================================
// Date context
// =========================================================================

#[test]
fn test_lines_before_first_header_use_today() {
    let export = "오전 9:00, 철수 : 날짜 없음\n2024년 1월 20일 토요일\n오후 4:25, 영희 : 날짜 있음\n";
    let table = KakaoParser::with_config(lenient()).parse_str(export).unwrap();

    assert_eq!(table.report().defaulted_date_count, 1);
    let undated = table.iter().find(|m| m.author == "철수").unwrap();
    // Parsing may straddle midnight.
    assert!(undated.timestamp.date() <= Local::now().date_naive());
    assert_eq!(undated.timestamp.hour(), 9);
}

#[test]
fn test_skip_undated_lines() {
    let export = "오전 9:00, 철수 : 날짜 없음\n2024년 1월 20일 토요일\n오후 4:25, 영희 : 날짜 있음\n";
    let config = lenient().with_date_fallback(DateFallback::Skip);
    let table = KakaoParser::with_config(config).parse_str(export).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.messages()[0].author, "영희");
    assert_eq!(table.report().rows_dropped, 1);
}

#[test]
fn test_later_header_overrides_earlier() {
    let export = "\
2024년 1월 20일 토요일
오후 11:59, 철수 : 밤
2024년 1월 21일 일요일
오전 12:01, 철수 : 자정 넘음
";
    let table = KakaoParser::with_config(lenient()).parse_str(export).unwrap();
    let days: Vec<u32> = table
        .iter()
        .map(|m| chrono::Datelike::day(&m.timestamp))
        .collect();
    assert_eq!(days, [20, 21]);
}

// =========================================================================
// Line content
// =========================================================================

#[test]
fn test_author_with_spaces_and_text_with_colons() {
    let line = "오후 4:25, 김 철수 : 회의 시간: 3:30 : 확정";
    let LineKind::Message { author, text, .. } = classify_line(line) else {
        panic!("expected a message");
    };
    assert_eq!(author, "김 철수");
    assert_eq!(text, "회의 시간: 3:30 : 확정");
}

#[test]
fn test_blank_author_line_is_dropped() {
    let export = "2024년 1월 20일 토요일\n오후 4:25,   : 안녕\n오후 4:26, 영희 : ㅇㅇ\n";
    let table = KakaoParser::with_config(lenient()).parse_str(export).unwrap();

    assert_eq!(table.len(), 1);
    assert_eq!(table.messages()[0].author, "영희");
    assert_eq!(table.report().rows_dropped, 1);
    assert!(table.iter().all(|m| !m.author.is_empty()));
}

#[test]
fn test_crlf_line_endings() {
    let export = "2024년 1월 20일 토요일\r\n오후 4:25, 철수 : 안녕\r\n오후 4:26, 영희 : ㅇㅇ\r\n";
    let table = KakaoParser::with_config(lenient()).parse_str(export).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.messages()[0].text, "안녕");
}

#[test]
fn test_emoji_and_markup_untouched() {
    let export = "2024년 1월 20일 토요일\n오후 4:25, 철수 : <b>굵게</b> 🎉🔥 **별표**\n";
    let table = KakaoParser::with_config(lenient()).parse_str(export).unwrap();
    let msg = &table.messages()[0];
    assert_eq!(msg.text, "<b>굵게</b> 🎉🔥 **별표**");
    assert_eq!(msg.length(), 19);
}

#[test]
fn test_multiline_message_drop_and_merge() {
    let export = "2024년 1월 20일 토요일\n오후 4:25, 철수 : 첫 줄\n둘째 줄\n셋째 줄\n오후 4:26, 영희 : ㅇㅇ\n";

    let dropped = KakaoParser::with_config(lenient()).parse_str(export).unwrap();
    assert_eq!(dropped.messages()[0].text, "첫 줄");
    assert_eq!(dropped.report().rows_dropped, 2);

    let merged = KakaoParser::with_config(lenient().with_continuation(ContinuationPolicy::Merge))
        .parse_str(export)
        .unwrap();
    assert_eq!(merged.messages()[0].text, "첫 줄\n둘째 줄\n셋째 줄");
    assert_eq!(merged.report().lines_merged, 2);
    assert_eq!(merged.len(), 2);
}

#[test]
fn test_system_notices_are_not_messages() {
    let export = "\
2024년 1월 20일 토요일
2024년 1월 20일 오후 4:00: 철수님이 영희님을 초대했습니다.
오후 4:25, 철수 : 안녕
";
    let table = KakaoParser::with_config(lenient()).parse_str(export).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.report().rows_dropped, 1);
}

// =========================================================================
// Thresholds and fallbacks
// =========================================================================

#[test]
fn test_short_export_below_threshold_keeps_line_rows() {
    // Two messages is below the default threshold of ten, and there is no
    // table layout to fall back to.
    let export = "2024년 1월 20일 토요일\n오후 4:25, 철수 : 안녕\n오후 4:26, 영희 : ㅇㅇ\n";
    let table = KakaoParser::new().parse_str(export).unwrap();
    assert_eq!(table.len(), 2);
}

#[test]
fn test_empty_and_whitespace_inputs() {
    for input in ["", "\n\n", "   \t\n"] {
        let err = KakaoParser::new().parse_str(input).unwrap_err();
        assert!(err.is_unsupported_format(), "input {input:?}");
    }
}

#[test]
fn test_tabular_rows_with_bad_dates_are_dropped() {
    let csv = "Date,User,Message\n2024-01-20 16:25:00,a,ok\nnot a date,b,skip\n2024-01-20,c,midnight\n";
    let table = KakaoParser::new().parse_str(csv).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.report().rows_dropped, 1);
    assert_eq!(table.messages()[0].timestamp.hour(), 0);
}

#[test]
fn test_tabular_header_with_padding() {
    let csv = " 날짜 , 사용자 , 메시지 \n2024.01.20 16:25,철수,안녕\n";
    let table = KakaoParser::new().parse_str(csv).unwrap();
    assert_eq!(table.len(), 1);
}
