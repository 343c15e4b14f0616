// Peregrine Assembler and SHIMMER Genome Assembly Toolkit
// 2019, 2020, 2021- (c) by Jason, Chen-Shan, Chin
//
// This Source Code Form is subject to the terms of the
// Creative Commons Attribution-NonCommercial-ShareAlike 4.0 International License.
//
// You should have received a copy of the license along with this
// work. If not, see <http://creativecommons.org/licenses/by-nc-sa/4.0/>.

#![allow(dead_code)]

//
// readers and writers for the ids, clm and tour files
//
// ids:  name<TAB>size[<TAB>recover]
// clm:  ctgA<o> ctgB<o><TAB>nlinks<TAB>d1 d2 ...
// tour: >name lines followed by contig<o> tokens, o is one of + - ?
//

use super::contacts::{ContactStore, ContigInfo, LinkRecord, FWD, REV};
use super::error::{Result, ScaffoldError};
use flate2::bufread::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Open a file for line reading, gz-compressed files are detected by their
/// magic bytes and decoded on the fly.
pub fn open_reader<P: AsRef<Path>>(filepath: P) -> Result<Box<dyn BufRead>> {
    let file = File::open(filepath.as_ref())?;
    let mut reader = BufReader::new(file);
    let mut is_gzfile = false;
    {
        let r = reader.by_ref();
        let mut buf = Vec::<u8>::new();
        let _ = r.take(2).read_to_end(&mut buf);
        if buf == [0x1F_u8, 0x8B_u8] {
            log::info!(
                "input file: {} detected as gz-compressed file",
                filepath.as_ref().display()
            );
            is_gzfile = true;
        }
    }
    reader.seek(SeekFrom::Start(0))?;
    if is_gzfile {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader))))
    } else {
        Ok(Box::new(reader))
    }
}

pub fn strand_from_char(c: char) -> Option<u8> {
    match c {
        '+' => Some(FWD),
        '-' => Some(REV),
        _ => None,
    }
}

pub fn strand_char(strand: u8) -> char {
    if strand == REV {
        '-'
    } else {
        '+'
    }
}

// `name+`, `name-`; the last char is the orientation
fn split_oriented(token: &str, line: usize) -> Result<(String, u8)> {
    let mut chars = token.chars();
    let o = chars.next_back();
    match o.and_then(strand_from_char) {
        Some(strand) if !chars.as_str().is_empty() => Ok((chars.as_str().to_string(), strand)),
        _ => Err(ScaffoldError::parse(
            line,
            format!("expect an oriented contig like `tig0001+`, got `{}`", token),
        )),
    }
}

pub fn parse_ids<R: BufRead>(reader: R) -> Result<Vec<ContigInfo>> {
    let mut contigs = Vec::<ContigInfo>::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let mut fields = line.split_whitespace();
        let name = match fields.next() {
            Some(name) => name,
            None => continue,
        };
        let size = fields
            .next()
            .ok_or_else(|| ScaffoldError::parse(line_no, "missing contig size"))?
            .parse::<u32>()
            .map_err(|e| ScaffoldError::parse(line_no, format!("bad contig size: {}", e)))?;
        let mut ctg = ContigInfo::new(contigs.len() as u32, name, size);
        ctg.recover = fields.next() == Some("recover");
        contigs.push(ctg);
    }
    log::info!("{} contigs in the ids file", contigs.len());
    Ok(contigs)
}

pub fn parse_clm_line(line: &str, line_no: usize) -> Result<LinkRecord> {
    let mut fields = line.trim().split('\t');
    let pair = fields.next().unwrap_or("");
    let mut tigs = pair.split(' ').filter(|s| !s.is_empty());
    let (ctg0, strand0) = split_oriented(tigs.next().unwrap_or(""), line_no)?;
    let (ctg1, strand1) = split_oriented(tigs.next().unwrap_or(""), line_no)?;

    let nlinks = fields
        .next()
        .ok_or_else(|| ScaffoldError::parse(line_no, "missing link count"))?
        .trim()
        .parse::<u32>()
        .map_err(|e| ScaffoldError::parse(line_no, format!("bad link count: {}", e)))?;
    let dists = fields
        .next()
        .unwrap_or("")
        .split_whitespace()
        .map(|d| {
            d.parse::<u32>()
                .map_err(|e| ScaffoldError::parse(line_no, format!("bad distance `{}`: {}", d, e)))
        })
        .collect::<Result<Vec<u32>>>()?;

    Ok(LinkRecord {
        ctg0,
        strand0,
        ctg1,
        strand1,
        nlinks,
        dists,
    })
}

/// Load every clm record into the store. Returns (records used, records skipped).
pub fn read_clm<R: BufRead>(reader: R, store: &mut ContactStore) -> Result<(usize, usize)> {
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let rec = parse_clm_line(&line, i + 1)?;
        store.record_link(&rec);
    }
    log::info!(
        "clm records: {} used, {} skipped (unknown contigs), {} contig pairs",
        store.n_used(),
        store.n_skipped(),
        store.n_contacts()
    );
    Ok((store.n_used(), store.n_skipped()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TourRecord {
    pub name: String,
    // None for `?` or a bare name
    pub contigs: Vec<(String, Option<u8>)>,
}

pub fn parse_tour<R: BufRead>(reader: R) -> Result<Vec<TourRecord>> {
    let mut records = Vec::<TourRecord>::new();
    for line in reader.lines() {
        let line = line?;
        let mut words = line.split_whitespace().peekable();
        match words.peek() {
            None => continue,
            Some(w) if w.starts_with('>') => {
                records.push(TourRecord {
                    name: w.get(1..).unwrap_or("").to_string(),
                    contigs: vec![],
                });
                continue;
            }
            _ => (),
        }
        if records.is_empty() {
            records.push(TourRecord {
                name: String::new(),
                contigs: vec![],
            });
        }
        let rec = match records.last_mut() {
            Some(rec) => rec,
            None => continue,
        };
        for w in words {
            let (name, strand) = match w.chars().last() {
                Some('+') | Some('-') | Some('?') if w.len() > 1 => {
                    let (n, o) = w.split_at(w.len() - 1);
                    (n, o.chars().next().and_then(strand_from_char))
                }
                _ => (w, None),
            };
            rec.contigs.push((name.to_string(), strand));
        }
    }
    Ok(records)
}

pub fn tour_token(name: &str, strand: Option<u8>) -> String {
    match strand {
        Some(s) => format!("{}{}", name, strand_char(s)),
        None => name.to_string(),
    }
}

pub fn write_tour<W: Write>(out: &mut W, name: &str, tokens: &[String]) -> Result<()> {
    writeln!(out, ">{}", name)?;
    writeln!(out, "{}", tokens.join(" "))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_ids() {
        let ids = "tig00015093\t46912\ntig00035238\t46779\trecover\n\ntig00030900\t119291\n";
        let contigs = parse_ids(Cursor::new(ids)).unwrap();
        assert_eq!(contigs.len(), 3);
        assert_eq!(contigs[1].name, "tig00035238");
        assert_eq!(contigs[1].size, 46779);
        assert!(contigs[1].recover);
        assert!(!contigs[2].recover);
        assert_eq!(contigs[2].idx, 2);

        match parse_ids(Cursor::new("a\t10\nb\tx\n")) {
            Err(ScaffoldError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_clm_line() {
        let rec = parse_clm_line("tig1+ tig2-\t3\t1200 5000 80000", 1).unwrap();
        assert_eq!(rec.ctg0, "tig1");
        assert_eq!(rec.strand0, FWD);
        assert_eq!(rec.ctg1, "tig2");
        assert_eq!(rec.strand1, REV);
        assert_eq!(rec.nlinks, 3);
        assert_eq!(rec.dists, vec![1200, 5000, 80000]);

        assert!(parse_clm_line("tig1 tig2-\t3\t1 2 3", 4).is_err());
        assert!(parse_clm_line("tig1+ tig2-", 5).is_err());
        assert!(parse_clm_line("tig1+ tig2-\t3\t1 x 3", 6).is_err());
    }

    #[test]
    fn test_read_clm_skips_unknown_contigs() {
        let mut store = ContactStore::new(vec![
            ContigInfo::new(0, "a", 10_000),
            ContigInfo::new(1, "b", 10_000),
        ]);
        let clm = "a+ b+\t2\t100 200\na+ z-\t1\t50\n\nb- a+\t2\t300 400\n";
        let (used, skipped) = read_clm(Cursor::new(clm), &mut store).unwrap();
        assert_eq!(used, 2);
        assert_eq!(skipped, 1);
        assert_eq!(store.n_contacts(), 1);
    }

    #[test]
    fn test_parse_and_write_tour() {
        let tour = ">INIT\ntig1+ tig2- tig3?\n>FINAL\ntig3 tig1+\n";
        let records = parse_tour(Cursor::new(tour)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "INIT");
        assert_eq!(
            records[0].contigs,
            vec![
                ("tig1".to_string(), Some(FWD)),
                ("tig2".to_string(), Some(REV)),
                ("tig3".to_string(), None)
            ]
        );
        assert_eq!(records[1].contigs[0], ("tig3".to_string(), None));

        let mut out = Vec::<u8>::new();
        let tokens = vec![tour_token("tig1", Some(FWD)), tour_token("tig2", Some(REV))];
        write_tour(&mut out, "scaffold_1", &tokens).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), ">scaffold_1\ntig1+ tig2-\n");
    }

    #[test]
    fn test_open_reader_handles_gz() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("x.ids");
        let gz = dir.path().join("x.ids.gz");
        std::fs::write(&plain, "a\t100\n").unwrap();
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(b"a\t100\n").unwrap();
        enc.finish().unwrap();

        for p in [plain, gz].iter() {
            let contigs = parse_ids(open_reader(p).unwrap()).unwrap();
            assert_eq!(contigs.len(), 1);
            assert_eq!(contigs[0].size, 100);
        }
    }
}
