use std::path::Path;

/// Short description of a file for display purposes
pub fn determine_file_type(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "py" => "🐍 Python script".to_string(),
        "sh" => "🐚 shell script".to_string(),
        "bat" | "cmd" => "🪟 batch file".to_string(),
        "ps1" => "⚡ PowerShell script".to_string(),
        "" => "📄 file".to_string(),
        other => format!("📄 .{other} file"),
    }
}
