use attendance_tally::workflows::attendance::report::{to_csv_string, to_xlsx_bytes};
use attendance_tally::workflows::attendance::{
    extract_names, normalize_name, parse_filename_date, tally, Blacklist, NumberedEntryExtractor,
    PresenceMark, RunContext, RunNotice, UploadedFile,
};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::BTreeSet;
use std::io::{Cursor, Read, Seek};

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn read_entry<R: Read + Seek>(archive: &mut zip::ZipArchive<R>, name: &str) -> String {
    let mut contents = String::new();
    archive
        .by_name(name)
        .expect(name)
        .read_to_string(&mut contents)
        .expect("xml is utf-8");
    contents
}

/// Reads the first worksheet of an XLSX export back into a text grid and
/// lists the (row, column) positions that were stored as numbers.
fn read_worksheet(bytes: &[u8]) -> (Vec<Vec<String>>, Vec<(usize, usize)>) {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).expect("xlsx is a zip archive");
    let shared = read_entry(&mut archive, "xl/sharedStrings.xml");
    let sheet = read_entry(&mut archive, "xl/worksheets/sheet1.xml");

    let strings: Vec<String> = Regex::new(r"<si><t[^>]*>([^<]*)</t></si>")
        .expect("shared string pattern")
        .captures_iter(&shared)
        .map(|caps| caps[1].to_string())
        .collect();
    let cell = Regex::new(r#"<c r="([A-Z]+)(\d+)"([^>]*)><v>([^<]*)</v></c>"#)
        .expect("cell pattern");

    let mut grid: Vec<Vec<String>> = Vec::new();
    let mut numeric = Vec::new();
    for caps in cell.captures_iter(&sheet) {
        let col = caps[1]
            .bytes()
            .fold(0usize, |acc, b| acc * 26 + usize::from(b - b'A' + 1))
            - 1;
        let row = caps[2].parse::<usize>().expect("row number") - 1;
        let value = if caps[3].contains(r#"t="s""#) {
            strings[caps[4].parse::<usize>().expect("string index")].clone()
        } else {
            numeric.push((row, col));
            let number: f64 = caps[4].parse().expect("numeric cell");
            format!("{number}")
        };

        if grid.len() <= row {
            grid.resize_with(row + 1, Vec::new);
        }
        if grid[row].len() <= col {
            grid[row].resize(col + 1, String::new());
        }
        grid[row][col] = value;
    }

    (grid, numeric)
}

fn weekly_logs() -> Vec<UploadedFile> {
    vec![
        UploadedFile::new(
            "0509출석.txt",
            "[출석 체크]\n1) 1조 홍길동\n2) 하고랩스 김민수\n3) 새싹조/runner_01\n",
        ),
        UploadedFile::new(
            "5월 16일 모임.txt",
            "1) 2조 홍길동\n2) 김민수/하고랩스\n3) ...\n",
        ),
        UploadedFile::new("2024.05.23.txt", "1) 사부작사부작 이영희\n2) BGO runner_01\n"),
        UploadedFile::new("메모.txt", "1) 홍길동\n"),
    ]
}

#[test]
fn documented_examples_hold() {
    // The extraction pattern already skips a leading group label; the
    // normalizer drops one that survives inside the span.
    let extraction = extract_names(&NumberedEntryExtractor, "3) 1조 홍길동");
    assert_eq!(extraction.names, vec!["홍길동"]);
    assert_eq!(normalize_name("1조 홍길동", &Blacklist::standard()), "홍길동");

    let extraction = extract_names(&NumberedEntryExtractor, "2) 하고랩스 김민수");
    assert_eq!(extraction.names, vec!["하고랩스 김민수"]);
    assert_eq!(normalize_name(&extraction.names[0], &Blacklist::standard()), "김민수");

    assert_eq!(
        parse_filename_date("0509출석.txt", 2024).map(|parsed| parsed.date),
        Some(ymd(2024, 5, 9))
    );
    assert_eq!(
        parse_filename_date("5월 9일 모임.txt", 2024).map(|parsed| parsed.date),
        Some(ymd(2024, 5, 9))
    );
}

#[test]
fn dates_without_matching_lines_still_become_columns() {
    let files = vec![
        UploadedFile::new("0509.txt", "1) 홍길동"),
        UploadedFile::new("0510.txt", "오늘은 휴강입니다"),
    ];
    let outcome = tally(&RunContext::default(), &files);

    assert_eq!(
        outcome.table.header(),
        vec!["이름", "2024-05-09", "2024-05-10", "총 횟수"]
    );
    assert_eq!(outcome.table.records(), vec![vec!["홍길동", "O", "X", "1"]]);
    assert!(outcome.notices.is_empty());
}

#[test]
fn weekly_batch_tallies_each_participant() {
    let outcome = tally(&RunContext::default(), &weekly_logs());
    let table = &outcome.table;

    assert_eq!(
        table.dates(),
        &[ymd(2024, 5, 9), ymd(2024, 5, 16), ymd(2024, 5, 23)]
    );
    assert_eq!(
        table.records(),
        vec![
            vec!["홍길동", "O", "O", "X", "2"],
            vec!["김민수", "O", "O", "X", "2"],
            vec!["runner_01", "O", "X", "O", "2"],
            vec!["이영희", "X", "X", "O", "1"],
        ]
    );

    assert_eq!(
        outcome.notices,
        vec![
            RunNotice::UnmatchedLine {
                file: "5월 16일 모임.txt".to_string(),
                line: "3) ...".to_string(),
            },
            RunNotice::UnrecognizedDate {
                file: "메모.txt".to_string(),
            },
        ]
    );
}

#[test]
fn totals_match_present_marks_and_columns_match_parsed_dates() {
    let files = weekly_logs();
    let context = RunContext::default();
    let outcome = tally(&context, &files);

    let parsed: BTreeSet<NaiveDate> = files
        .iter()
        .filter_map(|file| parse_filename_date(&file.filename, context.assumed_year))
        .map(|parsed| parsed.date)
        .collect();
    assert_eq!(
        outcome.table.dates().iter().copied().collect::<BTreeSet<_>>(),
        parsed
    );

    for row in outcome.table.rows() {
        let present = row
            .marks
            .iter()
            .filter(|mark| **mark == PresenceMark::Present)
            .count();
        assert_eq!(row.total, present, "{}", row.name);
        assert_eq!(row.marks.len(), outcome.table.dates().len());
    }
}

#[test]
fn normalization_is_deterministic() {
    let blacklist = Blacklist::standard();
    for raw in ["1조 홍길동", "BGO runner_01", "zed abc", "민수 철수", "하고랩스"] {
        assert_eq!(normalize_name(raw, &blacklist), normalize_name(raw, &blacklist));
    }
}

#[test]
fn korean_candidates_always_win() {
    let blacklist = Blacklist::standard();
    for raw in [
        "runner_01 홍길동",
        "홍길동 runner_01 long_identifier",
        "1조/하고랩스/이영희/alpha_beta",
        "zz 김철",
    ] {
        let canonical = normalize_name(raw, &blacklist);
        let length = canonical.chars().count();
        assert!((2..=3).contains(&length), "{raw} -> {canonical}");
        assert!(
            canonical.chars().all(|c| ('가'..='힣').contains(&c)),
            "{raw} -> {canonical}"
        );
    }
}

#[test]
fn exports_share_the_same_grid() {
    let outcome = tally(&RunContext::default(), &weekly_logs());
    let csv = to_csv_string(&outcome.table).expect("csv encodes");

    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("이름,2024-05-09,2024-05-16,2024-05-23,총 횟수")
    );
    let body: Vec<Vec<String>> = lines
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect();
    assert_eq!(body, outcome.table.records());

    let xlsx = to_xlsx_bytes(&outcome.table).expect("xlsx encodes");
    let (grid, numeric) = read_worksheet(&xlsx);
    assert_eq!(grid[0], outcome.table.header());
    assert_eq!(grid[1..].to_vec(), outcome.table.records());
    assert_eq!(grid[1], vec!["홍길동", "O", "O", "X", "2"]);
    assert_eq!(numeric, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);
}

#[test]
fn json_view_lists_columns_rows_and_notices() {
    let outcome = tally(&RunContext::default(), &weekly_logs());
    let value = serde_json::to_value(outcome.view()).expect("view serializes");

    assert_eq!(value["assumed_year"], 2024);
    assert_eq!(value["columns"][0], "이름");
    assert_eq!(value["rows"].as_array().map(Vec::len), Some(4));
    assert_eq!(value["participants"], 4);
    assert_eq!(value["notices"][0]["severity"], "warning");
    assert_eq!(value["notices"][1]["kind"], "unrecognized_date");
    assert_eq!(value["notices"][1]["file"], "메모.txt");
}
