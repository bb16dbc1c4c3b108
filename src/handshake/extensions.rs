//! TLS extensions. Spec.md §1/§4.3 restrict this engine to ServerName (SNI)
//! passthrough: the client may send it, the decoder otherwise ignores
//! extension content.

use crate::codec::{CodecError, Reader, Writer};

const EXTENSION_TYPE_SERVER_NAME: u16 = 0;
const SERVER_NAME_TYPE_HOST_NAME: u8 = 0;

/// A decoded extension. Anything other than `server_name` is retained only
/// as raw bytes — the engine never acts on it.
#[derive(Debug, Clone)]
pub enum Extension {
    ServerName(String),
    Raw { ext_type: u16, data: Vec<u8> },
}

/// Encodes the client's extension list. Only ever contains a ServerName
/// extension in this engine; an empty `server_name` omits the extensions
/// block's content (an empty `u16` length) rather than sending a
/// zero-length list marker for no extensions at all, matching how
/// `ClientHello.extensions` is optional on the wire.
pub fn encode_server_name_extension(host_name: &str) -> Vec<u8> {
    let mut ext = Vec::new();
    ext.put_u16(EXTENSION_TYPE_SERVER_NAME);

    let mut server_name_list = Vec::new();
    server_name_list.put_u8(SERVER_NAME_TYPE_HOST_NAME);
    server_name_list.put_vec_u16(host_name.as_bytes());

    let mut ext_body = Vec::new();
    ext_body.put_vec_u16(&server_name_list);

    ext.put_vec_u16(&ext_body);
    ext
}

/// Decodes a `u16`-length-prefixed extensions block (present on both
/// ClientHello and ServerHello). Returns the list of decoded extensions;
/// unrecognized extension types are preserved as `Extension::Raw` and
/// otherwise ignored by the driver.
pub fn decode_extensions(r: &mut Reader) -> Result<Vec<Extension>, CodecError> {
    if r.remaining() == 0 {
        return Ok(Vec::new());
    }

    let block = r.vec_u16()?;
    let mut inner = Reader::new(block);
    let mut out = Vec::new();
    while inner.remaining() > 0 {
        let ext_type = inner.u16()?;
        let data = inner.vec_u16()?;
        if ext_type == EXTENSION_TYPE_SERVER_NAME {
            out.push(decode_server_name(data)?);
        } else {
            out.push(Extension::Raw {
                ext_type,
                data: data.to_vec(),
            });
        }
    }
    Ok(out)
}

fn decode_server_name(data: &[u8]) -> Result<Extension, CodecError> {
    let mut inner = Reader::new(data);
    let list = inner.vec_u16()?;
    let mut list_reader = Reader::new(list);
    // A ServerNameList may in principle carry multiple entries; this
    // engine only ever looks at the first `host_name` entry (spec.md §1:
    // "TLS extensions beyond ServerName ... passthrough").
    loop {
        if list_reader.remaining() == 0 {
            return Ok(Extension::Raw {
                ext_type: EXTENSION_TYPE_SERVER_NAME,
                data: data.to_vec(),
            });
        }
        let name_type = list_reader.u8()?;
        let name = list_reader.vec_u16()?;
        if name_type == SERVER_NAME_TYPE_HOST_NAME {
            let host = String::from_utf8_lossy(name).into_owned();
            return Ok(Extension::ServerName(host));
        }
    }
}

/// Extracts the SNI host name from a decoded extension list, if present.
pub fn find_server_name(extensions: &[Extension]) -> Option<&str> {
    extensions.iter().find_map(|e| match e {
        Extension::ServerName(name) => Some(name.as_str()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_server_name() {
        let entry = encode_server_name_extension("example.com");
        let mut block = Vec::new();
        block.put_vec_u16(&entry);
        let mut r = Reader::new(&block);
        let decoded = decode_extensions(&mut r).unwrap();
        assert_eq!(find_server_name(&decoded), Some("example.com"));
    }
}
