use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn tmp_path(name: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("tonelink-cli");
    fs::create_dir_all(&dir).expect("Failed to create temp dir");
    dir.join(name)
}

fn run_tonelink(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tonelink"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("Failed to execute tonelink")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn test_encode_prints_bits() {
    let output = run_tonelink(&["encode", "Hi"]);
    assert!(output.status.success(), "encode failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "0100100001101001");
}

#[test]
fn test_decode_prints_text() {
    let output = run_tonelink(&["decode", "0100100001101001"]);
    assert!(output.status.success(), "decode failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hi");
}

#[test]
fn test_decode_thirteen_bits_fails() {
    let output = run_tonelink(&["decode", "0100100001101"]);
    assert!(!output.status.success(), "13 bits should not decode");
    assert!(
        stderr(&output).contains("not a multiple of 8"),
        "unexpected error output: {}",
        stderr(&output)
    );
}

#[test]
fn test_encode_rejects_wide_characters() {
    let output = run_tonelink(&["encode", "\u{263a}"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not fit in 8 bits"));
}

#[test]
fn test_send_and_receive_through_wav() {
    let wav = tmp_path("hi.wav");
    let wav_arg = wav.to_str().unwrap();

    let sent = run_tonelink(&["send", "Hi", "--wav", wav_arg]);
    assert!(sent.status.success(), "send failed: {}", stderr(&sent));
    assert!(stdout(&sent).contains("Sent 16 bits"), "got: {}", stdout(&sent));

    // 16 bits x 147 samples, 16-bit PCM
    let reader = hound::WavReader::open(&wav).expect("Output is not a WAV file");
    assert_eq!(reader.spec().sample_rate, 44100);
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.duration(), 16 * 147);

    let received = run_tonelink(&["receive", "--wav", wav_arg]);
    assert!(received.status.success(), "receive failed: {}", stderr(&received));
    assert_eq!(stdout(&received), "Hi");
}

#[test]
fn test_custom_plan_from_config_file() {
    let config = tmp_path("plan.json");
    fs::write(
        &config,
        r#"{ "sample_rate": 48000, "freq_zero": 1200, "freq_one": 2400 }"#,
    )
    .expect("Failed to write config");
    let wav = tmp_path("plan.wav");

    let config_arg = config.to_str().unwrap();
    let wav_arg = wav.to_str().unwrap();

    let sent = run_tonelink(&["--config", config_arg, "send", "Plan B", "--wav", wav_arg]);
    assert!(sent.status.success(), "send failed: {}", stderr(&sent));
    let reader = hound::WavReader::open(&wav).expect("Output is not a WAV file");
    assert_eq!(reader.spec().sample_rate, 48000);

    let received = run_tonelink(&["--config", config_arg, "receive", "--wav", wav_arg]);
    assert!(received.status.success(), "receive failed: {}", stderr(&received));
    assert_eq!(stdout(&received), "Plan B");
}

#[test]
fn test_receive_with_partial_byte_window_fails() {
    let wav = tmp_path("partial.wav");
    let wav_arg = wav.to_str().unwrap();
    let sent = run_tonelink(&["send", "Hi", "--wav", wav_arg]);
    assert!(sent.status.success(), "send failed: {}", stderr(&sent));

    // Default 5 s window -> 1500 bit intervals, not whole characters
    let received = run_tonelink(&["--capture-secs", "5", "receive", "--wav", wav_arg]);
    assert!(!received.status.success());
    assert!(stderr(&received).contains("1500"), "got: {}", stderr(&received));
}

#[test]
fn test_receive_silence_is_rejected() {
    let wav = tmp_path("silence.wav");
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&wav, spec).expect("Failed to create WAV");
    for _ in 0..(8 * 147) {
        writer.write_sample(0i16).expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");

    let received = run_tonelink(&["receive", "--wav", wav.to_str().unwrap()]);
    assert!(!received.status.success());
    assert!(stderr(&received).contains("rejected"), "got: {}", stderr(&received));
}

#[test]
fn test_blank_send_is_skipped() {
    let wav = tmp_path("blank.wav");
    fs::remove_file(&wav).ok();

    let output = run_tonelink(&["send", "   ", "--wav", wav.to_str().unwrap()]);
    assert!(output.status.success(), "send failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "Nothing to send");
    assert!(!wav.exists(), "Blank message should not produce audio");
}

#[test]
fn test_loopback_round_trip() {
    let output = run_tonelink(&["loopback", "Hello over the air!"]);
    assert!(output.status.success(), "loopback failed: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hello over the air!");
}

#[test]
fn test_invalid_tone_plan_is_refused() {
    let output = run_tonelink(&["--freq-zero", "3000", "encode", "Hi"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Invalid configuration"));
}

#[test]
fn test_help_explains_capture_window() {
    let output = run_tonelink(&["receive", "--help"]);
    assert!(output.status.success());
    let help = stdout(&output);
    assert!(help.contains("--capture-secs"));
    assert!(help.contains("multiple of 8 bits"), "got: {}", help);
}
