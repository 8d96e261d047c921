//! Binary session files (`.ic`): var-ints and length-prefixed UTF-8 aw
//! the way doon. Saves and loads a whole `ProjectData`.

use std::fs;
use std::path::Path;

use crate::coverage::{ClassData, LineData, ProjectData};
use crate::error::{SiccarError, SiccarResult};
use crate::logging;

const MAGIC: &[u8; 4] = b"SICV";
const VERSION: u64 = 1;

/// Save coverage data tae a session file
pub fn save(project: &ProjectData, path: &Path) -> SiccarResult<()> {
    let bytes = to_bytes(project);
    fs::write(path, &bytes).map_err(|e| SiccarError::SessionFile {
        path: path.display().to_string(),
        message: format!("couldnae write: {}", e),
    })?;
    logging::debug(
        "siccar::report",
        format!(
            "saved {} classes ({} bytes) tae {}",
            project.class_count(),
            bytes.len(),
            path.display()
        ),
    );
    Ok(())
}

/// Load coverage data frae a session file. Strict on magic and version,
/// tolerant o trailing bytes.
pub fn load(path: &Path) -> SiccarResult<ProjectData> {
    let bytes = fs::read(path).map_err(|e| SiccarError::SessionFile {
        path: path.display().to_string(),
        message: format!("couldnae read: {}", e),
    })?;
    from_bytes(&bytes).map_err(|message| SiccarError::SessionFile {
        path: path.display().to_string(),
        message,
    })
}

pub fn to_bytes(project: &ProjectData) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(MAGIC);
    write_uint(&mut buf, VERSION);

    write_uint(&mut buf, project.class_count() as u64);
    for class in project.classes() {
        write_utf(&mut buf, &class.name);
    }
    for class in project.classes() {
        write_class(&mut buf, class);
    }
    buf
}

pub fn from_bytes(bytes: &[u8]) -> Result<ProjectData, String> {
    let mut reader = Reader::new(bytes);
    let magic = reader.take(4)?;
    if magic != MAGIC {
        return Err("bad magic - no a siccar session file".to_string());
    }
    let version = reader.uint()?;
    if version != VERSION {
        return Err(format!(
            "unsupported session version {} (expected {})",
            version, VERSION
        ));
    }

    let class_count = reader.uint()? as usize;
    let mut names = Vec::with_capacity(class_count.min(reader.remaining()));
    for _ in 0..class_count {
        names.push(reader.utf()?);
    }

    let mut project = ProjectData::new();
    for name in &names {
        read_class(&mut reader, project.get_or_create_class(name))?;
    }
    Ok(project)
}

fn write_class(buf: &mut Vec<u8>, class: &ClassData) {
    // Lines grouped intae methods by signature, first-seen order
    let mut methods: Vec<(&str, Vec<&LineData>)> = Vec::new();
    for line in class.lines() {
        match methods
            .iter_mut()
            .find(|(sig, _)| *sig == line.method_signature)
        {
            Some((_, lines)) => lines.push(line),
            None => methods.push((&line.method_signature, vec![line])),
        }
    }

    write_uint(buf, methods.len() as u64);
    for (signature, lines) in methods {
        write_utf(buf, signature);
        write_uint(buf, lines.len() as u64);
        for line in lines {
            write_uint(buf, line.line as u64);
            write_uint(buf, line.hits);
            write_uint(buf, line.jumps.len() as u64);
            for jump in &line.jumps {
                write_uint(buf, jump.true_hits);
                write_uint(buf, jump.false_hits);
            }
            write_uint(buf, line.switches.len() as u64);
            for switch in &line.switches {
                write_uint(buf, switch.default_hits);
                write_uint(buf, switch.keys.len() as u64);
                for &key in &switch.keys {
                    write_zigzag(buf, key);
                }
                for &hits in &switch.hits {
                    write_uint(buf, hits);
                }
            }
        }
    }
}

fn read_class(reader: &mut Reader<'_>, class: &mut ClassData) -> Result<(), String> {
    let method_count = reader.uint()? as usize;
    for _ in 0..method_count {
        let signature = reader.utf()?;
        let line_count = reader.uint()? as usize;
        for _ in 0..line_count {
            let line_number = reader.uint()? as usize;
            let hits = reader.uint()?;
            let line = class.get_or_create_line(line_number, &signature);
            line.touch(hits);

            let jump_count = reader.uint()? as usize;
            for _ in 0..jump_count {
                let true_hits = reader.uint()?;
                let false_hits = reader.uint()?;
                let idx = line.register_jump();
                line.jumps[idx].true_hits = true_hits;
                line.jumps[idx].false_hits = false_hits;
            }

            let switch_count = reader.uint()? as usize;
            for _ in 0..switch_count {
                let default_hits = reader.uint()?;
                let key_count = reader.uint()? as usize;
                let mut keys = Vec::with_capacity(key_count.min(reader.remaining()));
                for _ in 0..key_count {
                    keys.push(reader.zigzag()?);
                }
                let mut hits = Vec::with_capacity(key_count.min(reader.remaining()));
                for _ in 0..key_count {
                    hits.push(reader.uint()?);
                }
                let idx = line.register_switch(keys);
                line.switches[idx].hits = hits;
                line.switches[idx].default_hits = default_hits;
            }
        }
    }
    Ok(())
}

// --- var-int plumbing ---

fn write_uint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

fn write_zigzag(buf: &mut Vec<u8>, value: i64) {
    write_uint(buf, ((value << 1) ^ (value >> 63)) as u64);
}

fn write_utf(buf: &mut Vec<u8>, s: &str) {
    write_uint(buf, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Reader { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], String> {
        // Widths come aff the wire, so the check cannae add them tae pos
        if n > self.bytes.len() - self.pos {
            return Err("truncated session data".to_string());
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Bytes left unread - a corrupt count can never honestly exceed it
    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn uint(&mut self) -> Result<u64, String> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = *self
                .bytes
                .get(self.pos)
                .ok_or_else(|| "truncated var-int".to_string())?;
            self.pos += 1;
            if shift >= 64 {
                return Err("var-int too lang".to_string());
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn zigzag(&mut self) -> Result<i64, String> {
        let raw = self.uint()?;
        Ok(((raw >> 1) as i64) ^ -((raw & 1) as i64))
    }

    fn utf(&mut self) -> Result<String, String> {
        let len = self.uint()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| "invalid UTF-8 in session data".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::LineCoverage;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_project() -> ProjectData {
        let mut project = ProjectData::new();
        {
            let class = project.get_or_create_class("when_enum.braw");
            let line = class.get_or_create_line(9, "<main>");
            line.touch(3);
            let j = line.register_jump();
            line.jumps[j].true_hits = 2;
            line.jumps[j].false_hits = 1;
            let s = line.register_switch(vec![0, 1, 2]);
            line.switches[s].hits = vec![1, 1, 0];
            line.switches[s].default_hits = 1;

            class.get_or_create_line(10, "<main>").touch(1);
        }
        project
            .get_or_create_class("when_enum.braw::describe")
            .get_or_create_line(2, "describe(s)")
            .touch(3);
        project
    }

    #[test]
    fn test_varint_encoding() {
        let mut buf = Vec::new();
        write_uint(&mut buf, 0);
        write_uint(&mut buf, 127);
        write_uint(&mut buf, 128);
        write_uint(&mut buf, 300);
        assert_eq!(buf, vec![0x00, 0x7f, 0x80, 0x01, 0xac, 0x02]);

        let mut reader = Reader::new(&buf);
        assert_eq!(reader.uint().unwrap(), 0);
        assert_eq!(reader.uint().unwrap(), 127);
        assert_eq!(reader.uint().unwrap(), 128);
        assert_eq!(reader.uint().unwrap(), 300);
    }

    #[test]
    fn test_zigzag_keys() {
        let mut buf = Vec::new();
        for v in [0i64, -1, 1, -2, i64::MAX, i64::MIN] {
            write_zigzag(&mut buf, v);
        }
        let mut reader = Reader::new(&buf);
        assert_eq!(reader.zigzag().unwrap(), 0);
        assert_eq!(reader.zigzag().unwrap(), -1);
        assert_eq!(reader.zigzag().unwrap(), 1);
        assert_eq!(reader.zigzag().unwrap(), -2);
        assert_eq!(reader.zigzag().unwrap(), i64::MAX);
        assert_eq!(reader.zigzag().unwrap(), i64::MIN);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cov.ic");
        let project = sample_project();

        save(&project, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, project);
        let line = loaded
            .get_class("when_enum.braw")
            .unwrap()
            .line(9)
            .unwrap();
        assert_eq!(line.status(), LineCoverage::Partial);
        assert_eq!(line.switches[0].keys, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_project_round_trips() {
        let bytes = to_bytes(&ProjectData::new());
        let loaded = from_bytes(&bytes).unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_trailing_bytes_tolerated() {
        let mut bytes = to_bytes(&sample_project());
        bytes.extend_from_slice(b"whitever comes efter");
        let loaded = from_bytes(&bytes).unwrap();
        assert_eq!(loaded, sample_project());
    }

    #[test]
    fn test_bad_magic_rejected() {
        let err = from_bytes(b"NOPE\x01").unwrap_err();
        assert!(err.contains("magic"));
    }

    #[test]
    fn test_wrong_version_rejected() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        write_uint(&mut bytes, 99);
        let err = from_bytes(&bytes).unwrap_err();
        assert!(err.contains("version"));
    }

    #[test]
    fn test_truncated_file_fails_loudly() {
        let bytes = to_bytes(&sample_project());
        let err = from_bytes(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(err.contains("truncated"));
    }

    #[test]
    fn test_huge_length_in_corrupt_file_errors_cleanly() {
        // A string length o u64::MAX must come back as a truncation
        // error, nae an arithmetic panic or a monster allocation
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        write_uint(&mut bytes, VERSION);
        write_uint(&mut bytes, 1); // class count
        write_uint(&mut bytes, u64::MAX); // name length
        let err = from_bytes(&bytes).unwrap_err();
        assert!(err.contains("truncated"));
    }

    #[test]
    fn test_huge_class_count_errors_cleanly() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(MAGIC);
        write_uint(&mut bytes, VERSION);
        write_uint(&mut bytes, u64::MAX); // class count wi nae classes
        assert!(from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_load_missing_file_names_the_path() {
        let err = load(Path::new("naewhere/cov.ic")).unwrap_err();
        match err {
            SiccarError::SessionFile { path, .. } => assert!(path.contains("naewhere")),
            other => panic!("expected SessionFile error, got {:?}", other),
        }
    }
}
