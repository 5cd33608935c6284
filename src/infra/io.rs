use anyhow::{Context, Result};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

pub enum FileContent {
    Mapped(Mmap),
    Buffered(Vec<u8>),
}

impl AsRef<[u8]> for FileContent {
    fn as_ref(&self) -> &[u8] {
        match self {
            FileContent::Mapped(mmap) => &mmap[..],
            FileContent::Buffered(bytes) => bytes.as_slice(),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD {
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: read-only mapping; the file is not modified while mapped
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    } else {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(bytes))
    }
}

/// Read a source file as text. Invalid UTF-8 sequences are replaced rather
/// than rejected, since class bodies are only searched, never rewritten.
pub fn read_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let content = read_file_smart(path)?;
    Ok(String::from_utf8_lossy(content.as_ref()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_text_small_file() -> Result<()> {
        let tmp = TempDir::new()?;
        let p = tmp.path().join("Foo.cls");
        std::fs::write(&p, "public class Foo {}")?;
        assert_eq!(read_text(&p)?, "public class Foo {}");
        Ok(())
    }

    #[test]
    fn test_read_text_large_file_is_mapped() -> Result<()> {
        let tmp = TempDir::new()?;
        let p = tmp.path().join("Big.cls");
        let body = "a".repeat(MMAP_THRESHOLD as usize + 16);
        std::fs::write(&p, &body)?;

        assert!(matches!(read_file_smart(&p)?, FileContent::Mapped(_)));
        assert_eq!(read_text(&p)?.len(), body.len());
        Ok(())
    }

    #[test]
    fn test_read_text_replaces_invalid_utf8() -> Result<()> {
        let tmp = TempDir::new()?;
        let p = tmp.path().join("Odd.cls");
        std::fs::write(&p, [b'F', b'o', b'o', 0xff])?;
        assert!(read_text(&p)?.starts_with("Foo"));
        Ok(())
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(read_text("/definitely/not/here.cls").is_err());
    }
}
