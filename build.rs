fn main() {
    // Only the FFmpeg backend links against libav
    if std::env::var_os("CARGO_FEATURE_FFMPEG").is_none() {
        return;
    }

    #[cfg(target_os = "windows")]
    windows::copy_ffmpeg_dlls();
}

#[cfg(target_os = "windows")]
mod windows {
    use std::path::{Path, PathBuf};

    const REQUIRED_DLL_PREFIXES: &[&str] = &["avcodec-", "avformat-", "avutil-", "swresample-"];

    /// Copy the libav DLLs next to the binary so it runs from `target/`.
    pub fn copy_ffmpeg_dlls() {
        let ffmpeg_bin = PathBuf::from("third_party/ffmpeg/bin");
        println!("cargo:rerun-if-changed=third_party/ffmpeg/bin");

        if !ffmpeg_bin.exists() {
            println!(
                "cargo:warning=FFmpeg DLLs not found at {}",
                ffmpeg_bin.display()
            );
            return;
        }

        let Some(out_dir) = std::env::var_os("OUT_DIR").map(PathBuf::from) else {
            return;
        };
        // OUT_DIR is target/<profile>/build/<crate>/out
        let Some(target_dir) = out_dir.ancestors().nth(3) else {
            println!("cargo:warning=Cannot resolve target dir");
            return;
        };

        let Ok(entries) = std::fs::read_dir(&ffmpeg_bin) else {
            println!("cargo:warning=Cannot read {}", ffmpeg_bin.display());
            return;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            let (Some(name), true) = (path.file_name(), is_required_dll(&path)) else {
                continue;
            };
            let dest = target_dir.join(name);
            if !dest.exists() || modified(&path) > modified(&dest) {
                match std::fs::copy(&path, &dest) {
                    Ok(_) => println!("cargo:warning=Copied {} to output dir", path.display()),
                    Err(e) => println!("cargo:warning=Failed to copy {}: {}", path.display(), e),
                }
            }
        }

        println!("cargo:rustc-link-search=native={}", ffmpeg_bin.display());
    }

    fn modified(path: &Path) -> std::time::SystemTime {
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
    }

    fn is_required_dll(path: &Path) -> bool {
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        let lower = file_name.to_ascii_lowercase();
        lower.ends_with(".dll") && REQUIRED_DLL_PREFIXES.iter().any(|p| lower.starts_with(p))
    }
}
