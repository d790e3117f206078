use std::fs;
use std::path::Path;

use assert_cmd::Command;
use etherparse::PacketBuilder;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const TWO_LINE_STORE: &str = "timestamp,src_ip,dst_ip,protocol,length\n\
    2024-01-01T00:00:00.000000,10.0.0.1,10.0.0.2,TCP,1500\n\
    2024-01-01T00:00:00.500000,10.0.0.1,10.0.0.3,UDP,512\n";

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("trafficlens"))
}

fn write_store(dir: &Path, contents: &str) -> std::path::PathBuf {
    let store = dir.join("packets.csv");
    fs::write(&store, contents).expect("write store");
    store
}

/// Legacy little-endian pcap with one UDP and one TCP frame.
fn write_sample_pcap(path: &Path) {
    let mut frames = Vec::new();
    let udp = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([10, 0, 0, 1], [10, 0, 0, 3], 64)
        .udp(5353, 53);
    let mut frame = Vec::new();
    udp.write(&mut frame, &[0u8; 484]).expect("udp frame");
    frames.push((0u32, frame));
    let tcp = PacketBuilder::ethernet2([2, 0, 0, 0, 0, 1], [2, 0, 0, 0, 0, 2])
        .ipv4([10, 0, 0, 2], [10, 0, 0, 1], 64)
        .tcp(443, 40000, 1, 1024);
    let mut frame = Vec::new();
    tcp.write(&mut frame, &[0u8; 1460]).expect("tcp frame");
    frames.push((250_000u32, frame));

    let mut out = Vec::new();
    out.extend_from_slice(&0xa1b2_c3d4u32.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes());
    // thiszone, sigfigs, snaplen, Ethernet link type
    for word in [0u32, 0, 65_535, 1] {
        out.extend_from_slice(&word.to_le_bytes());
    }
    for (usec, frame) in frames {
        let len = frame.len() as u32;
        for word in [1_704_067_200u32, usec, len, len] {
            out.extend_from_slice(&word.to_le_bytes());
        }
        out.extend_from_slice(&frame);
    }
    fs::write(path, out).expect("write pcap");
}

#[test]
fn help_supports_analyse_and_analyze() {
    cmd().arg("analyse").arg("--help").assert().success();
    cmd().arg("analyze").arg("--help").assert().success();
}

#[test]
fn analyze_writes_all_artifacts() {
    let temp = TempDir::new().expect("tempdir");
    let store = write_store(temp.path(), TWO_LINE_STORE);
    let out = temp.path().join("out");

    cmd()
        .arg("analyze")
        .arg(&store)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("OK: 2 packets analysed"));

    for name in [
        "packets_vs_size.svg",
        "packets_vs_time.svg",
        "protocol_distribution.svg",
        "size_vs_time.svg",
        "top_talkers.svg",
        "report.txt",
        "summary.json",
    ] {
        assert!(out.join(name).is_file(), "missing {name}");
    }

    let report = fs::read_to_string(out.join("report.txt")).expect("report");
    assert!(report.contains("Total packets: 2\n"));
    assert!(report.contains("Protocol count: {TCP=1, UDP=1}\n"));

    let summary: Value =
        serde_json::from_str(&fs::read_to_string(out.join("summary.json")).expect("summary"))
            .expect("valid json");
    assert_eq!(summary["top_talkers"][0]["source"], "10.0.0.1");
    assert_eq!(summary["top_talkers"][0]["packets"], 2);
    assert_eq!(summary["protocols"]["UDP"], 1);
}

#[test]
fn analyze_json_format_and_options() {
    let temp = TempDir::new().expect("tempdir");
    let store = write_store(temp.path(), TWO_LINE_STORE);
    let out = temp.path().join("out");

    cmd()
        .arg("analyse")
        .arg(&store)
        .arg("-o")
        .arg(&out)
        .arg("--format")
        .arg("json")
        .arg("--bins")
        .arg("5")
        .arg("--bucket")
        .arg("s")
        .arg("--quiet")
        .assert()
        .success()
        .stderr(contains("OK:").not());

    let histogram: Value = serde_json::from_str(
        &fs::read_to_string(out.join("packets_vs_size.json")).expect("histogram"),
    )
    .expect("valid json");
    assert_eq!(histogram["kind"], "histogram");
    assert_eq!(histogram["points"].as_array().expect("points").len(), 5);

    let per_second: Value = serde_json::from_str(
        &fs::read_to_string(out.join("packets_vs_time.json")).expect("series"),
    )
    .expect("valid json");
    assert_eq!(per_second["points"].as_array().expect("points").len(), 1);
    assert_eq!(per_second["points"][0]["value"], 2.0);
}

#[test]
fn verbose_flag_enables_debug_logging() {
    let temp = TempDir::new().expect("tempdir");
    let store = write_store(temp.path(), TWO_LINE_STORE);
    let out = temp.path().join("out");

    cmd()
        .arg("-v")
        .arg("analyze")
        .arg(&store)
        .arg("--out")
        .arg(&out)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(contains("DEBUG").and(contains("analysing store")));

    cmd()
        .arg("analyze")
        .arg(&store)
        .arg("--out")
        .arg(&out)
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(contains("analysing store").not());
}

#[test]
fn analyze_empty_store_reports_no_data() {
    let temp = TempDir::new().expect("tempdir");
    let store = write_store(temp.path(), "timestamp,src_ip,dst_ip,protocol,length\n");
    let out = temp.path().join("out");

    cmd()
        .arg("analyze")
        .arg(&store)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stderr(contains("No data"));
    assert!(!out.exists());
}

#[test]
fn analyze_missing_store_shows_error_and_hint() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg("analyze")
        .arg(temp.path().join("missing.csv"))
        .assert()
        .code(2)
        .stderr(contains("error: store not found").and(contains("hint:")));
}

#[test]
fn analyze_glob_must_match_one_store() {
    let temp = TempDir::new().expect("tempdir");
    fs::write(temp.path().join("a.csv"), TWO_LINE_STORE).expect("write");
    fs::write(temp.path().join("b.csv"), TWO_LINE_STORE).expect("write");
    let pattern = temp.path().join("*.csv");

    cmd()
        .arg("analyze")
        .arg(&pattern)
        .arg("--out")
        .arg(temp.path().join("out"))
        .assert()
        .failure()
        .stderr(contains("multiple files match pattern").and(contains("hint:")));

    let none = temp.path().join("*.missing");
    cmd()
        .arg("analyze")
        .arg(&none)
        .assert()
        .failure()
        .stderr(contains("no files match pattern"));
}

#[test]
fn analyze_unwritable_output_fails() {
    let temp = TempDir::new().expect("tempdir");
    let store = write_store(temp.path(), TWO_LINE_STORE);
    let blocker = temp.path().join("out");
    fs::write(&blocker, "file in the way").expect("write");

    cmd()
        .arg("analyze")
        .arg(&store)
        .arg("--out")
        .arg(&blocker)
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("failed to create output directory")));
}

#[test]
fn capture_replay_then_analyze() {
    let temp = TempDir::new().expect("tempdir");
    let pcap = temp.path().join("capture.pcap");
    write_sample_pcap(&pcap);
    let store = temp.path().join("data").join("packets.csv");

    cmd()
        .arg("capture")
        .arg("--replay")
        .arg(&pcap)
        .arg("--store")
        .arg(&store)
        .arg("--with-ports")
        .assert()
        .success()
        .stderr(contains("OK: captured 2 packets"));

    let text = fs::read_to_string(&store).expect("store");
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(
        lines,
        [
            "timestamp,src_ip,dst_ip,protocol,length,src_port,dst_port",
            "2024-01-01T00:00:00.000000,10.0.0.1,10.0.0.3,UDP,512,5353,53",
            "2024-01-01T00:00:00.250000,10.0.0.2,10.0.0.1,TCP,1500,443,40000",
        ]
    );

    let out = temp.path().join("out");
    cmd()
        .arg("analyze")
        .arg(&store)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();
    let report = fs::read_to_string(out.join("report.txt")).expect("report");
    assert!(report.contains("Protocol count: {TCP=1, UDP=1}"));
}

#[test]
fn capture_count_limits_replay() {
    let temp = TempDir::new().expect("tempdir");
    let pcap = temp.path().join("capture.pcap");
    write_sample_pcap(&pcap);
    let store = temp.path().join("packets.csv");

    cmd()
        .arg("capture")
        .arg("--replay")
        .arg(&pcap)
        .arg("--store")
        .arg(&store)
        .arg("--count")
        .arg("1")
        .assert()
        .success()
        .stderr(contains("OK: captured 1 packets"));

    let text = fs::read_to_string(&store).expect("store");
    assert_eq!(text.lines().count(), 2);
}

#[test]
fn capture_missing_replay_file_shows_hint() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg("capture")
        .arg("--replay")
        .arg(temp.path().join("missing.pcap"))
        .arg("--store")
        .arg(temp.path().join("packets.csv"))
        .assert()
        .code(2)
        .stderr(contains("error: replay file not found").and(contains("hint:")));
    assert!(!temp.path().join("packets.csv").exists());
}

#[test]
fn capture_without_device_selection_fails_non_interactively() {
    let temp = TempDir::new().expect("tempdir");

    cmd()
        .arg("capture")
        .arg("--store")
        .arg(temp.path().join("packets.csv"))
        .write_stdin("")
        .assert()
        .code(2)
        .stderr(contains("error:").and(contains("hint:")));
}

#[test]
fn selection_flags_conflict() {
    cmd()
        .arg("capture")
        .arg("--interface")
        .arg("eth0")
        .arg("--replay")
        .arg("x.pcap")
        .assert()
        .failure()
        .stderr(contains("cannot be used with"));
}

#[cfg(not(feature = "live"))]
#[test]
fn interfaces_without_live_support_explains_how_to_enable_it() {
    cmd()
        .arg("interfaces")
        .assert()
        .code(2)
        .stderr(contains("live capture support was not compiled in").and(contains("--features live")));
}
