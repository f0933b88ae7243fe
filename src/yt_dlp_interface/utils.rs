use std::path::Path;

pub fn ffmpeg_executable_name() -> &'static str {
    if cfg!(target_os = "windows") { "ffmpeg.exe" } else { "ffmpeg" }
}

pub fn yt_dlp_executable_name() -> &'static str {
    if cfg!(target_os = "windows") { "yt-dlp.exe" } else { "yt-dlp" }
}

pub fn is_executable_present(path: &Path) -> bool {
    path.is_file() && is_executable(path)
}

pub fn is_executable(path: &Path) -> bool {
    #[cfg(windows)]
    {
        path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("exe"))
    }
    #[cfg(not(windows))]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path).map_or(false, |metadata| {
            let permissions = metadata.permissions();
            permissions.mode() & 0o111 != 0
        })
    }
}

/// Creates an executable placeholder named `name` inside `dir`.
#[cfg(test)]
pub fn fake_executable(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_is_executable_present() {
        let temp_dir = TempDir::new().unwrap();

        let non_existent = temp_dir.path().join("non_existent.exe");
        assert!(!is_executable_present(&non_existent));

        let test_file = temp_dir.path().join("test.exe");
        {
            File::create(&test_file).unwrap();
        }

        // For Windows, any file with .exe extension is considered executable
        #[cfg(windows)]
        {
            assert!(is_executable_present(&test_file));
        }

        #[cfg(unix)]
        {
            assert!(!is_executable_present(&test_file));

            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&test_file).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&test_file, perms).unwrap();
            assert!(is_executable_present(&test_file));
        }
    }

    #[test]
    fn test_directory_is_not_an_executable() {
        let temp_dir = TempDir::new().unwrap();
        let sub = temp_dir.path().join(ffmpeg_executable_name());
        std::fs::create_dir(&sub).unwrap();
        assert!(!is_executable_present(&sub));
    }

    #[test]
    fn test_fake_executable_is_detected() {
        let temp_dir = TempDir::new().unwrap();
        let path = fake_executable(temp_dir.path(), ffmpeg_executable_name());
        assert!(is_executable_present(&path));
    }
}
