//! Canon CR3 container.
//!
//! CR3 is an ISO base media file whose sensor track is CRX-compressed, a
//! codec `rawloader` does not implement. The same container carries a
//! full-size JPEG rendering in its first track; that rendering is developed
//! instead, with make, model and orientation read from the CMT1 TIFF block.

use super::RawDecodeError;

const CANON_UUID: [u8; 16] = [
    0x85, 0xc0, 0xb6, 0x87, 0x82, 0x0f, 0x11, 0xe0, 0x81, 0x11, 0xf4, 0xce, 0x46, 0x2b, 0x6a, 0x48,
];

const TAG_MAKE: u16 = 0x010f;
const TAG_MODEL: u16 = 0x0110;
const TAG_ORIENTATION: u16 = 0x0112;

/// Contents of a CR3 file needed to render it.
#[derive(Debug)]
pub(super) struct Cr3File<'a> {
    pub jpeg: &'a [u8],
    pub make: Option<String>,
    pub model: Option<String>,
    pub orientation: Option<u8>,
}

struct Atom<'a> {
    kind: [u8; 4],
    body: &'a [u8],
}

fn unreadable(message: &str) -> RawDecodeError {
    RawDecodeError::Unreadable(format!("CR3: {}", message))
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at.checked_add(4)?)?;
    Some(u32::from_be_bytes(bytes.try_into().ok()?))
}

fn be_u64(data: &[u8], at: usize) -> Option<u64> {
    let bytes = data.get(at..at.checked_add(8)?)?;
    Some(u64::from_be_bytes(bytes.try_into().ok()?))
}

/// Split a run of boxes into its children.
fn atoms(mut data: &[u8]) -> Result<Vec<Atom<'_>>, RawDecodeError> {
    let mut out = Vec::new();
    while data.len() >= 8 {
        let size = be_u32(data, 0).ok_or_else(|| unreadable("truncated box header"))?;
        let mut kind = [0u8; 4];
        kind.copy_from_slice(&data[4..8]);

        let (header, total) = match size {
            0 => (8, data.len()),
            1 => {
                let large = be_u64(data, 8).ok_or_else(|| unreadable("truncated box header"))?;
                (16, usize::try_from(large).unwrap_or(usize::MAX))
            }
            n => (8, n as usize),
        };
        if total < header || total > data.len() {
            return Err(unreadable("box extends past its parent"));
        }

        out.push(Atom {
            kind,
            body: &data[header..total],
        });
        data = &data[total..];
    }
    Ok(out)
}

fn find<'a, 'b>(atoms: &'b [Atom<'a>], kind: &[u8; 4]) -> Option<&'b Atom<'a>> {
    atoms.iter().find(|atom| &atom.kind == kind)
}

/// True for ISO base media files branded `crx `.
pub(super) fn is_cr3(data: &[u8]) -> bool {
    data.get(4..12) == Some(b"ftypcrx ".as_slice())
}

pub(super) fn parse(data: &[u8]) -> Result<Cr3File<'_>, RawDecodeError> {
    if !is_cr3(data) {
        return Err(unreadable("not a crx-branded container"));
    }
    let top = atoms(data)?;
    let moov = find(&top, b"moov").ok_or_else(|| unreadable("missing movie box"))?;
    let movie = atoms(moov.body)?;

    let tags = movie
        .iter()
        .filter(|atom| &atom.kind == b"uuid" && atom.body.get(..16) == Some(&CANON_UUID[..]))
        .find_map(|atom| atoms(&atom.body[16..]).ok())
        .and_then(|canon| find(&canon, b"CMT1").map(|cmt| TiffTags::parse(cmt.body)))
        .unwrap_or_default();

    let jpeg = match preview_from_track(data, &movie)? {
        Some(jpeg) => jpeg,
        None => preview_from_mdat(&top).ok_or_else(|| unreadable("no JPEG rendering found"))?,
    };

    Ok(Cr3File {
        jpeg,
        make: tags.make,
        model: tags.model,
        orientation: tags.orientation,
    })
}

/// The first sample of the first track, located through its sample table.
fn preview_from_track<'a>(
    data: &'a [u8],
    movie: &[Atom<'_>],
) -> Result<Option<&'a [u8]>, RawDecodeError> {
    let Some(trak) = find(movie, b"trak") else {
        return Ok(None);
    };

    let mut body = trak.body;
    for kind in [b"mdia", b"minf", b"stbl"] {
        let children = atoms(body)?;
        match find(&children, kind) {
            Some(atom) => body = atom.body,
            None => return Ok(None),
        }
    }
    let table = atoms(body)?;

    // stsz: version/flags, default size, count, then per-sample sizes
    let size = find(&table, b"stsz").and_then(|stsz| match be_u32(stsz.body, 4)? {
        0 => be_u32(stsz.body, 12),
        n => Some(n),
    });
    // co64 / stco: version/flags, count, then offsets
    let offset = find(&table, b"co64")
        .and_then(|co64| be_u64(co64.body, 8))
        .or_else(|| find(&table, b"stco").and_then(|stco| be_u32(stco.body, 8).map(u64::from)));

    let (Some(size), Some(offset)) = (size, offset) else {
        return Ok(None);
    };
    let start = usize::try_from(offset).map_err(|_| unreadable("chunk offset out of range"))?;
    let end = start
        .checked_add(size as usize)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| unreadable("preview extends past end of file"))?;

    let sample = &data[start..end];
    Ok(sample.starts_with(&[0xFF, 0xD8]).then_some(sample))
}

fn preview_from_mdat<'a>(top: &[Atom<'a>]) -> Option<&'a [u8]> {
    let mdat = find(top, b"mdat")?.body;
    let start = mdat.windows(3).position(|w| w == [0xFF, 0xD8, 0xFF])?;
    Some(&mdat[start..])
}

#[derive(Debug, Default)]
struct TiffTags {
    make: Option<String>,
    model: Option<String>,
    orientation: Option<u8>,
}

impl TiffTags {
    /// Read the few IFD0 entries used here. Malformed blocks yield nothing.
    fn parse(data: &[u8]) -> Self {
        Self::read(data).unwrap_or_default()
    }

    fn read(data: &[u8]) -> Option<Self> {
        let little = match data.get(..4)? {
            b"II\x2a\0" => true,
            b"MM\0\x2a" => false,
            _ => return None,
        };
        let u16_at = |at: usize| -> Option<u16> {
            let bytes: [u8; 2] = data.get(at..at + 2)?.try_into().ok()?;
            Some(if little {
                u16::from_le_bytes(bytes)
            } else {
                u16::from_be_bytes(bytes)
            })
        };
        let u32_at = |at: usize| -> Option<u32> {
            let bytes: [u8; 4] = data.get(at..at + 4)?.try_into().ok()?;
            Some(if little {
                u32::from_le_bytes(bytes)
            } else {
                u32::from_be_bytes(bytes)
            })
        };

        let ifd = u32_at(4)? as usize;
        let count = u16_at(ifd)? as usize;
        let mut tags = Self::default();

        for index in 0..count {
            let entry = ifd + 2 + index * 12;
            let (tag, kind, len) = (u16_at(entry)?, u16_at(entry + 2)?, u32_at(entry + 4)?);
            match (tag, kind) {
                (TAG_MAKE | TAG_MODEL, 2) => {
                    let len = len as usize;
                    let start = if len <= 4 {
                        entry + 8
                    } else {
                        u32_at(entry + 8)? as usize
                    };
                    let text = data.get(start..start.checked_add(len)?)?;
                    let text = String::from_utf8_lossy(text)
                        .trim_end_matches('\0')
                        .trim()
                        .to_string();
                    let text = Some(text).filter(|t| !t.is_empty());
                    if tag == TAG_MAKE {
                        tags.make = text;
                    } else {
                        tags.model = text;
                    }
                }
                (TAG_ORIENTATION, 3) => {
                    tags.orientation = u8::try_from(u16_at(entry + 8)?).ok();
                }
                _ => {}
            }
        }
        Some(tags)
    }
}
