/// 將秒數格式化為 `HhMmSs`
///
/// 時與分為 0 時省略該段，秒永遠保留
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total / 60) % 60;
    let secs = total % 60;

    let mut result = String::new();
    if hours > 0 {
        result.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        result.push_str(&format!("{minutes}m"));
    }
    result.push_str(&format!("{secs}s"));
    result
}

/// 將位元組數轉為易讀字串（B / KB / MB / GB）
///
/// 門檻為 0.1 KiB、0.1 MiB、0.1 GiB，保留兩位小數（四捨五入），小數為 `.00` 時去除
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let size = bytes as f64;
    let (value, unit) = if size < 0.1 * KIB {
        (size, "B")
    } else if size < 0.1 * MIB {
        (size / KIB, "KB")
    } else if size < 0.1 * GIB {
        (size / MIB, "MB")
    } else {
        (size / GIB, "GB")
    };

    // `{:.2}` 遇到剛好一半時取偶數，先自行進位
    let rounded = (value * 100.0).round() / 100.0;
    let number = format!("{rounded:.2}");
    let number = number.strip_suffix(".00").unwrap_or(&number);
    format!("{number}{unit}")
}
