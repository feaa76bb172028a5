//! ゲームが書き込み中のログファイルを読む
//!
//! ログは PSO2 が開いたまま追記しているので、書き込み側を妨げない
//! 共有モードで開く。失敗は呼び出し側に返し、握りつぶさない。

use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::Path;

#[cfg(windows)]
const FILE_SHARE_READ: u32 = 0x0000_0001;
#[cfg(windows)]
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
#[cfg(windows)]
const FILE_SHARE_DELETE: u32 = 0x0000_0004;

/// 他プロセスの書き込み・削除を許可して読み取り専用で開く
pub fn open_shared(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true);

    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        options.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE);
    }

    options.open(path)
}

/// ファイル全体を文字列として読む
pub fn read_text(path: &Path) -> io::Result<String> {
    let mut file = open_shared(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(decode(&bytes))
}

/// ファイル全体を読み、空白のみの行を除いた行を返す
pub fn read_all_lines(path: &Path) -> io::Result<Vec<String>> {
    Ok(split_lines(&read_text(path)?))
}

/// BOM を見て文字コードを判定し、文字列にする（不正なバイト列は置換）
pub fn decode(bytes: &[u8]) -> String {
    match bytes {
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> String {
    // 書き込み途中で奇数バイトになっている場合、末尾の1バイトは捨てる
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| to_unit([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

/// CRLF（または LF）で分割し、空白のみの行を捨てる
pub fn split_lines(content: &str) -> Vec<String> {
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}
