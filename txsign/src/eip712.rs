//! EIP-712 typed structured data hashing, MetaMask v4 flavour.
//!
//! The document is the usual `{types, primaryType, domain, message}`
//! JSON. Struct arrays are hashed element-wise, as
//! `keccak(hashStruct(e0) || hashStruct(e1) || ...)`, which is what
//! `eth_signTypedData_v4` does. Referenced struct types are appended to
//! a type string in the order they are first met, depth first.
//!
//! Values are limited on purpose:
//! - integers must fit in 64 bits (`uint` in `u64`, `int` in `i64`) and
//!   may be JSON numbers, decimal strings or `0x` hex strings
//! - arrays of integers, bytes and bools are refused
//! - nesting deeper than [`MAX_EIP712_DEPTH`] is refused
//!
//! # Security
//!
//! - Every limit is checked before descending, so hostile type graphs
//!   fail with an error code instead of exhausting the stack
//! - Encoded type strings are zeroized once hashed

use core::fmt;
use core::num::IntErrorKind;

use serde_json::{Map, Value};
use txsign_common::{EthAddress, Hash256, SignError, Signature};
use zeroize::Zeroize;

use crate::confirm::{require, ButtonRequest, Confirm};
use crate::crypto::{keccak256, recover_address, HdNode, Keccak256Hasher};

/// Distinct struct types one type string may reference.
pub const MAX_USERDEF_TYPES: usize = 10;
/// Longest encoded type string.
pub const STRBUFSIZE: usize = 511;
/// Longest struct type name, array suffix included, plus one.
pub const MAX_TYPESTRING: usize = 33;
/// Longest `bytesN` value text, `0x` included.
pub const MAX_ENCBYTEN_SIZE: usize = 66;
/// Deepest struct nesting, in both type strings and values.
pub const MAX_EIP712_DEPTH: usize = 12;

/// `0x` plus 40 hex digits.
const ADDRESS_SIZE: usize = 42;

const DOMAIN_TYPE: &str = "EIP712Domain";

/// Status codes shared with the host.
pub const SUCCESS: u32 = 1;
/// The message is empty and only the domain was hashed.
pub const NULL_MSG_HASH: u32 = 2;

/// Failure codes. Values 1 and 2 are [`SUCCESS`] and [`NULL_MSG_HASH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Eip712Error {
    GeneralError = 3,
    UdefNameError = 4,
    UdefsOverflow = 5,
    UdefArrayNameErr = 6,
    AddrStringVflow = 7,
    BytesnStringError = 8,
    BytesnSizeError = 9,
    IntArrayError = 10,
    BytesnArrayError = 11,
    BoolArrayError = 12,
    RecursionError = 13,
    JsonPtypeNameErr = 14,
    JsonPtypeValErr = 15,
    JsonTypesPropErr = 16,
    JsonTypeSPropErr = 17,
    JsonDPropErr = 18,
    MsgNoDs = 19,
    JsonMPropErr = 20,
    JsonPtypesObjErr = 21,
    JsonTypeSErr = 22,
    JsonTypeSNameErr = 23,
    JsonNoPairs = 25,
    JsonPairsNoText = 26,
    JsonNoPairsSib = 27,
    TypeNotEncodable = 28,
    JsonNoPairVal = 29,
    JsonNoPairName = 30,
    JsonTypeTNoVal = 31,
    AddrStringNull = 32,
    JsonTypeWNoVal = 33,
    /// Encoded type string longer than [`STRBUFSIZE`].
    TypeStringOverflow = 34,
    /// Integer outside the supported 64-bit range.
    IntRangeError = 35,
}

impl Eip712Error {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for Eip712Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EIP-712 error {}", self.code())
    }
}

impl From<Eip712Error> for SignError {
    fn from(err: Eip712Error) -> Self {
        match err {
            Eip712Error::RecursionError => SignError::RecursionLimit,
            Eip712Error::UdefsOverflow => SignError::TooManyUserTypes,
            _ => SignError::InvalidTypedData,
        }
    }
}

// =============================================================================
// Document
// =============================================================================

/// A parsed and structurally checked typed-data document.
#[derive(Debug, Clone)]
pub struct TypedData {
    types: Map<String, Value>,
    primary_type: String,
    domain: Value,
    message: Option<Value>,
}

impl TypedData {
    pub fn parse(json: &str) -> Result<Self, Eip712Error> {
        let root: Value = serde_json::from_str(json).map_err(|e| {
            log::debug!("typed data is not JSON: {}", e);
            Eip712Error::GeneralError
        })?;
        Self::from_value(root)
    }

    pub fn from_value(root: Value) -> Result<Self, Eip712Error> {
        let Value::Object(mut root) = root else {
            return Err(Eip712Error::GeneralError);
        };

        let types = match root.remove("types") {
            Some(Value::Object(types)) => types,
            _ => return Err(Eip712Error::JsonTypesPropErr),
        };
        if !types.contains_key(DOMAIN_TYPE) {
            return Err(Eip712Error::MsgNoDs);
        }
        for def in types.values() {
            if !def.is_array() {
                return Err(Eip712Error::JsonTypeSPropErr);
            }
        }

        let primary_type = match root.remove("primaryType") {
            Some(Value::String(name)) => name,
            _ => return Err(Eip712Error::JsonPtypeNameErr),
        };
        if !types.contains_key(&primary_type) {
            return Err(Eip712Error::JsonPtypeValErr);
        }

        let domain = match root.remove("domain") {
            Some(domain @ Value::Object(_)) => domain,
            _ => return Err(Eip712Error::JsonDPropErr),
        };

        let message = match root.remove("message") {
            None => return Err(Eip712Error::JsonMPropErr),
            Some(Value::Null) => None,
            Some(Value::Object(m)) if m.is_empty() => None,
            Some(m @ Value::Object(_)) => Some(m),
            Some(_) => return Err(Eip712Error::JsonMPropErr),
        };
        // A domain-only signature has no message to hash.
        let message = if primary_type == DOMAIN_TYPE { None } else { message };

        Ok(Self {
            types,
            primary_type,
            domain,
            message,
        })
    }

    pub fn primary_type(&self) -> &str {
        &self.primary_type
    }
}

/// The two struct hashes of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypedDataHash {
    pub domain_separator: Hash256,
    /// `None` for a null message.
    pub message_hash: Option<Hash256>,
}

impl TypedDataHash {
    /// `keccak256(0x1901 || domainSeparator || hashStruct(message))`, the
    /// message part left out for a null message.
    pub fn digest(&self) -> Hash256 {
        let mut hasher = Keccak256Hasher::new();
        hasher.update(&[0x19, 0x01]);
        hasher.update(&self.domain_separator);
        if let Some(message) = &self.message_hash {
            hasher.update(message);
        }
        hasher.finalize()
    }

    pub fn status(&self) -> u32 {
        if self.message_hash.is_some() {
            SUCCESS
        } else {
            NULL_MSG_HASH
        }
    }
}

// =============================================================================
// Types
// =============================================================================

struct Field<'a> {
    name: &'a str,
    ty: &'a str,
}

fn fields<'a>(types: &'a Map<String, Value>, name: &str) -> Result<Vec<Field<'a>>, Eip712Error> {
    let def = types.get(name).ok_or(Eip712Error::UdefNameError)?;
    let entries = def.as_array().ok_or(Eip712Error::JsonTypeSPropErr)?;
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_object().ok_or(Eip712Error::JsonTypeSErr)?;
            let name = entry
                .get("name")
                .ok_or(Eip712Error::JsonTypeSNameErr)?
                .as_str()
                .ok_or(Eip712Error::JsonPairsNoText)?;
            let ty = entry
                .get("type")
                .ok_or(Eip712Error::JsonTypeTNoVal)?
                .as_str()
                .ok_or(Eip712Error::JsonPairsNoText)?;
            if name.is_empty() {
                return Err(Eip712Error::JsonNoPairName);
            }
            Ok(Field { name, ty })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind<'a> {
    Address,
    String,
    Uint,
    Int,
    Bytes,
    BytesN(usize),
    Bool,
    Struct(&'a str),
}

fn int_width(width: &str) -> Option<()> {
    if width.is_empty() {
        return Some(());
    }
    let bits: u32 = width.parse().ok()?;
    (bits > 0 && bits <= 256 && bits % 8 == 0).then_some(())
}

fn atomic(base: &str) -> Option<Kind<'static>> {
    match base {
        "address" => Some(Kind::Address),
        "string" => Some(Kind::String),
        "bool" => Some(Kind::Bool),
        "bytes" => Some(Kind::Bytes),
        _ => {
            if let Some(n) = base.strip_prefix("bytes") {
                let n: usize = n.parse().ok()?;
                return (1..=32).contains(&n).then_some(Kind::BytesN(n));
            }
            if let Some(width) = base.strip_prefix("uint") {
                return int_width(width).map(|_| Kind::Uint);
            }
            if let Some(width) = base.strip_prefix("int") {
                return int_width(width).map(|_| Kind::Int);
            }
            None
        }
    }
}

/// Element kind of `ty` and whether it is an array. One array
/// dimension is supported.
fn kind_of<'t>(types: &Map<String, Value>, ty: &'t str) -> Result<(Kind<'t>, bool), Eip712Error> {
    let (base, array) = match ty.find('[') {
        Some(i) => {
            let dims = &ty[i..];
            let inner = dims
                .strip_prefix('[')
                .and_then(|d| d.strip_suffix(']'))
                .ok_or(Eip712Error::TypeNotEncodable)?;
            if !inner.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Eip712Error::TypeNotEncodable);
            }
            (&ty[..i], true)
        }
        None => (ty, false),
    };

    let kind = match atomic(base) {
        Some(kind) => kind,
        None if types.contains_key(base) => {
            if ty.len() >= MAX_TYPESTRING {
                return Err(if array {
                    Eip712Error::UdefArrayNameErr
                } else {
                    Eip712Error::UdefNameError
                });
            }
            Kind::Struct(base)
        }
        None if base.starts_with("bytes") || base.starts_with("int") || base.starts_with("uint") => {
            return Err(Eip712Error::TypeNotEncodable)
        }
        None => return Err(Eip712Error::UdefNameError),
    };

    if array {
        match kind {
            Kind::Uint | Kind::Int => return Err(Eip712Error::IntArrayError),
            Kind::Bytes | Kind::BytesN(_) => return Err(Eip712Error::BytesnArrayError),
            Kind::Bool => return Err(Eip712Error::BoolArrayError),
            _ => {}
        }
    }
    Ok((kind, array))
}

struct TypeEncoder<'a> {
    types: &'a Map<String, Value>,
    primary: &'a str,
    seen: Vec<&'a str>,
    out: String,
}

impl<'a> TypeEncoder<'a> {
    fn push(&mut self, s: &str) -> Result<(), Eip712Error> {
        if self.out.len() + s.len() > STRBUFSIZE {
            return Err(Eip712Error::TypeStringOverflow);
        }
        self.out.push_str(s);
        Ok(())
    }

    fn append(&mut self, name: &'a str, depth: usize) -> Result<(), Eip712Error> {
        if depth > MAX_EIP712_DEPTH {
            return Err(Eip712Error::RecursionError);
        }
        let fields = fields(self.types, name)?;
        let mut deps = Vec::new();

        self.push(name)?;
        self.push("(")?;
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.push(",")?;
            }
            self.push(field.ty)?;
            self.push(" ")?;
            self.push(field.name)?;

            if let (Kind::Struct(dep), _) = kind_of(self.types, field.ty)? {
                if dep == self.primary || self.seen.contains(&dep) {
                    continue;
                }
                if self.seen.len() == MAX_USERDEF_TYPES {
                    log::warn!("more than {} struct types referenced", MAX_USERDEF_TYPES);
                    return Err(Eip712Error::UdefsOverflow);
                }
                self.seen.push(dep);
                deps.push(dep);
            }
        }
        self.push(")")?;

        for dep in deps {
            self.append(dep, depth + 1)?;
        }
        Ok(())
    }
}

/// `encodeType(name)`: the struct's signature followed by those of the
/// struct types it references.
pub fn encode_type(types: &Map<String, Value>, name: &str) -> Result<String, Eip712Error> {
    let name = types
        .get_key_value(name)
        .map(|(k, _)| k.as_str())
        .ok_or(Eip712Error::UdefNameError)?;
    let mut encoder = TypeEncoder {
        types,
        primary: name,
        seen: Vec::new(),
        out: String::new(),
    };
    match encoder.append(name, 0) {
        Ok(()) => Ok(encoder.out),
        Err(e) => {
            encoder.out.zeroize();
            Err(e)
        }
    }
}

pub fn type_hash(types: &Map<String, Value>, name: &str) -> Result<Hash256, Eip712Error> {
    let mut encoded = encode_type(types, name)?;
    let hash = keccak256(encoded.as_bytes());
    encoded.zeroize();
    Ok(hash)
}

// =============================================================================
// Values
// =============================================================================

fn hex_value(s: &str) -> Result<Vec<u8>, Eip712Error> {
    let digits = s.strip_prefix("0x").ok_or(Eip712Error::BytesnStringError)?;
    hex::decode(digits).map_err(|_| Eip712Error::BytesnStringError)
}

fn parse_int(value: &Value, signed: bool) -> Result<i128, Eip712Error> {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .ok_or(Eip712Error::IntRangeError)?,
        Value::String(s) => {
            let (negative, digits) = match s.strip_prefix('-') {
                Some(d) => (true, d),
                None => (false, s.as_str()),
            };
            let magnitude = match digits.strip_prefix("0x") {
                Some(h) => u64::from_str_radix(h, 16),
                None => digits.parse::<u64>(),
            }
            .map_err(|e| match e.kind() {
                IntErrorKind::PosOverflow => Eip712Error::IntRangeError,
                _ => Eip712Error::JsonTypeWNoVal,
            })?;
            if negative {
                -i128::from(magnitude)
            } else {
                i128::from(magnitude)
            }
        }
        _ => return Err(Eip712Error::JsonTypeWNoVal),
    };

    let in_range = if signed {
        (i128::from(i64::MIN)..=i128::from(i64::MAX)).contains(&n)
    } else {
        (0..=i128::from(u64::MAX)).contains(&n)
    };
    if in_range {
        Ok(n)
    } else {
        Err(Eip712Error::IntRangeError)
    }
}

/// 32-byte encoding of an atomic value and the text to show for it.
fn encode_leaf(kind: Kind<'_>, value: &Value) -> Result<([u8; 32], String), Eip712Error> {
    let mut word = [0u8; 32];
    let shown = match kind {
        Kind::Address => {
            let s = value.as_str().ok_or(Eip712Error::AddrStringNull)?;
            if s.len() != ADDRESS_SIZE || !s.starts_with("0x") {
                return Err(Eip712Error::AddrStringVflow);
            }
            let bytes = hex::decode(&s[2..]).map_err(|_| Eip712Error::AddrStringVflow)?;
            word[12..].copy_from_slice(&bytes);
            s.to_string()
        }
        Kind::String => {
            let s = value.as_str().ok_or(Eip712Error::JsonTypeWNoVal)?;
            word = keccak256(s.as_bytes());
            s.to_string()
        }
        Kind::Bytes => {
            let s = value.as_str().ok_or(Eip712Error::JsonTypeWNoVal)?;
            word = keccak256(&hex_value(s)?);
            s.to_string()
        }
        Kind::BytesN(n) => {
            let s = value.as_str().ok_or(Eip712Error::JsonTypeWNoVal)?;
            if s.len() > MAX_ENCBYTEN_SIZE {
                return Err(Eip712Error::BytesnSizeError);
            }
            let bytes = hex_value(s)?;
            if bytes.len() > n {
                return Err(Eip712Error::BytesnSizeError);
            }
            word[..bytes.len()].copy_from_slice(&bytes);
            s.to_string()
        }
        Kind::Uint | Kind::Int => {
            let n = parse_int(value, kind == Kind::Int)?;
            if n < 0 {
                word = [0xff; 32];
            }
            word[16..].copy_from_slice(&n.to_be_bytes());
            n.to_string()
        }
        Kind::Bool => {
            let b = match value {
                Value::Bool(b) => *b,
                Value::String(s) if s == "true" => true,
                Value::String(s) if s == "false" => false,
                _ => return Err(Eip712Error::JsonTypeWNoVal),
            };
            word[31] = u8::from(b);
            b.to_string()
        }
        Kind::Struct(_) => return Err(Eip712Error::GeneralError),
    };
    Ok((word, shown))
}

/// Walks values against their types, collecting what to show.
struct StructHasher<'a> {
    types: &'a Map<String, Value>,
    /// (field path, value text) of every atomic value, in hash order.
    shown: Vec<(String, String)>,
}

impl<'a> StructHasher<'a> {
    fn new(types: &'a Map<String, Value>) -> Self {
        Self {
            types,
            shown: Vec::new(),
        }
    }

    /// `hashStruct(value)` for struct type `name`.
    fn hash_struct(
        &mut self,
        name: &str,
        value: &Value,
        path: &str,
        depth: usize,
    ) -> Result<Hash256, Eip712Error> {
        if depth > MAX_EIP712_DEPTH {
            log::warn!("typed data nested deeper than {}", MAX_EIP712_DEPTH);
            return Err(Eip712Error::RecursionError);
        }
        let object = value.as_object().ok_or(Eip712Error::JsonTypeWNoVal)?;
        let types = self.types;

        let mut hasher = Keccak256Hasher::new();
        hasher.update(&type_hash(types, name)?);

        for field in fields(types, name)? {
            let value = object.get(field.name).ok_or(Eip712Error::JsonNoPairVal)?;
            let label = if path.is_empty() {
                field.name.to_string()
            } else {
                format!("{}.{}", path, field.name)
            };

            let word = match kind_of(types, field.ty)? {
                (kind, true) => {
                    let items = value.as_array().ok_or(Eip712Error::JsonTypeWNoVal)?;
                    let mut array = Keccak256Hasher::new();
                    for (i, item) in items.iter().enumerate() {
                        let label = format!("{}[{}]", label, i);
                        array.update(&self.encode_value(kind, item, &label, depth)?);
                    }
                    array.finalize()
                }
                (kind, false) => self.encode_value(kind, value, &label, depth)?,
            };
            hasher.update(&word);
        }

        Ok(hasher.finalize())
    }

    fn encode_value(
        &mut self,
        kind: Kind<'_>,
        value: &Value,
        label: &str,
        depth: usize,
    ) -> Result<[u8; 32], Eip712Error> {
        match kind {
            Kind::Struct(name) => self.hash_struct(name, value, label, depth + 1),
            leaf => {
                let (word, shown) = encode_leaf(leaf, value)?;
                self.shown.push((label.to_string(), shown));
                Ok(word)
            }
        }
    }
}

/// Hashes of a document plus the values the user should see.
struct Encoded {
    hash: TypedDataHash,
    domain_fields: Vec<(String, String)>,
    message_fields: Vec<(String, String)>,
}

fn encode(data: &TypedData) -> Result<Encoded, Eip712Error> {
    let mut domain = StructHasher::new(&data.types);
    let domain_separator = domain.hash_struct(DOMAIN_TYPE, &data.domain, "", 0)?;

    let mut message = StructHasher::new(&data.types);
    let message_hash = match &data.message {
        Some(value) => Some(message.hash_struct(&data.primary_type, value, "", 0)?),
        None => None,
    };

    log::debug!(
        "hashed typed data for {} ({} message values)",
        data.primary_type,
        message.shown.len()
    );
    Ok(Encoded {
        hash: TypedDataHash {
            domain_separator,
            message_hash,
        },
        domain_fields: domain.shown,
        message_fields: message.shown,
    })
}

/// Hashes without asking anything.
pub fn hash_typed_data(data: &TypedData) -> Result<TypedDataHash, Eip712Error> {
    encode(data).map(|e| e.hash)
}

/// Hashes a document and walks the user through it: the domain on one
/// screen, then one screen per message value.
pub fn confirm_typed_data<C: Confirm + ?Sized>(
    ui: &mut C,
    data: &TypedData,
) -> Result<TypedDataHash, SignError> {
    let encoded = encode(data)?;

    let domain = encoded
        .domain_fields
        .iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("\n");
    require(ui, ButtonRequest::Other, "EIP-712 domain", &domain)?;

    for (name, value) in &encoded.message_fields {
        require(ui, ButtonRequest::ConfirmOutput, name, value)?;
    }
    Ok(encoded.hash)
}

/// Confirms and signs a typed-data document. `v` is `27 + recid`.
pub fn sign_typed_data<C: Confirm + ?Sized>(
    ui: &mut C,
    node: &HdNode,
    json: &str,
) -> Result<(TypedDataHash, Signature), SignError> {
    let data = TypedData::parse(json)?;
    let hash = confirm_typed_data(ui, &data)?;
    let (compact, recid) = node.sign_digest(&hash.digest())?;

    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&compact[..32]);
    s.copy_from_slice(&compact[32..]);
    log::info!("signed typed data ({})", data.primary_type());
    Ok((hash, Signature { v: 27 + recid, r, s }))
}

/// True when `signature` over the document recovers to `address`.
pub fn verify_typed_data(
    json: &str,
    signature: &Signature,
    address: &EthAddress,
) -> Result<bool, SignError> {
    let data = TypedData::parse(json)?;
    let digest = hash_typed_data(&data)?.digest();
    let recid = signature
        .v
        .checked_sub(27)
        .ok_or(SignError::InvalidData)?;
    let recovered = recover_address(&digest, &signature.compact(), recid)?;
    Ok(&recovered == address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::MockUi;
    use serde_json::json;

    fn domain_types() -> Value {
        json!([
            {"name": "name", "type": "string"},
            {"name": "chainId", "type": "uint256"}
        ])
    }

    fn doc(types: Value, primary: &str, message: Value) -> Result<TypedData, Eip712Error> {
        let mut types = types;
        types["EIP712Domain"] = domain_types();
        TypedData::from_value(json!({
            "types": types,
            "primaryType": primary,
            "domain": {"name": "Test", "chainId": 1},
            "message": message,
        }))
    }

    fn mail_types() -> Map<String, Value> {
        let v = json!({
            "Person": [
                {"name": "name", "type": "string"},
                {"name": "wallet", "type": "address"}
            ],
            "Mail": [
                {"name": "from", "type": "Person"},
                {"name": "to", "type": "Person"},
                {"name": "contents", "type": "string"}
            ]
        });
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_encode_type() {
        assert_eq!(
            encode_type(&mail_types(), "Mail").unwrap(),
            "Mail(Person from,Person to,string contents)Person(string name,address wallet)"
        );
        assert_eq!(
            type_hash(&mail_types(), "Mail").unwrap(),
            hex_literal::hex!("a0cedeb2dc280ba39b857546d74f5549c3a1d7bdc2dd96bf881f76108e23dac2")
        );
    }

    #[test]
    fn test_struct_array_is_hash_of_hashes() {
        let data = doc(
            json!({
                "Person": [
                    {"name": "name", "type": "string"},
                    {"name": "wallet", "type": "address"}
                ],
                "Group": [
                    {"name": "name", "type": "string"},
                    {"name": "members", "type": "Person[]"}
                ]
            }),
            "Group",
            json!({
                "name": "g",
                "members": [
                    {"name": "a", "wallet": "0x1111111111111111111111111111111111111111"},
                    {"name": "b", "wallet": "0x2222222222222222222222222222222222222222"}
                ]
            }),
        )
        .unwrap();

        let person = |name: &str, byte: u8| {
            let mut buf = keccak256(b"Person(string name,address wallet)").to_vec();
            buf.extend_from_slice(&keccak256(name.as_bytes()));
            buf.extend_from_slice(&[0u8; 12]);
            buf.extend_from_slice(&[byte; 20]);
            keccak256(&buf)
        };
        let mut members = person("a", 0x11).to_vec();
        members.extend_from_slice(&person("b", 0x22));

        let mut group = keccak256(
            b"Group(string name,Person[] members)Person(string name,address wallet)",
        )
        .to_vec();
        group.extend_from_slice(&keccak256(b"g"));
        group.extend_from_slice(&keccak256(&members));

        let hash = hash_typed_data(&data).unwrap();
        assert_eq!(hash.message_hash, Some(keccak256(&group)));
    }

    #[test]
    fn test_self_reference_and_depth_limit() {
        let types = json!({
            "Node": [
                {"name": "name", "type": "string"},
                {"name": "children", "type": "Node[]"}
            ]
        });
        let Value::Object(map) = types.clone() else {
            unreachable!()
        };
        assert_eq!(
            encode_type(&map, "Node").unwrap(),
            "Node(string name,Node[] children)"
        );

        let nested = |levels: usize| {
            let mut value = json!({"name": "leaf", "children": []});
            for _ in 0..levels {
                value = json!({"name": "n", "children": [value]});
            }
            value
        };

        let shallow = doc(types.clone(), "Node", nested(MAX_EIP712_DEPTH)).unwrap();
        assert!(hash_typed_data(&shallow).is_ok());

        let deep = doc(types, "Node", nested(MAX_EIP712_DEPTH + 1)).unwrap();
        assert_eq!(hash_typed_data(&deep), Err(Eip712Error::RecursionError));
        assert_eq!(
            SignError::from(Eip712Error::RecursionError),
            SignError::RecursionLimit
        );
    }

    #[test]
    fn test_too_many_struct_types() {
        let mut types = Map::new();
        let mut top = Vec::new();
        for i in 0..=MAX_USERDEF_TYPES {
            types.insert(format!("T{}", i), json!([]));
            top.push(json!({"name": format!("f{}", i), "type": format!("T{}", i)}));
        }
        types.insert("Top".to_string(), Value::Array(top));
        assert_eq!(encode_type(&types, "Top"), Err(Eip712Error::UdefsOverflow));

        types.remove("T10");
        let Some(Value::Array(top)) = types.get_mut("Top") else {
            unreachable!()
        };
        top.pop();
        assert!(encode_type(&types, "Top").is_ok());
    }

    #[test]
    fn test_integers() {
        let types = Map::new();
        let enc = |ty: &str, v: Value| {
            let (kind, _) = kind_of(&types, ty)?;
            encode_leaf(kind, &v).map(|(w, _)| w)
        };

        assert_eq!(enc("int8", json!("-1")).unwrap(), [0xff; 32]);
        assert_eq!(enc("uint256", json!("0x10")).unwrap()[31], 16);
        assert_eq!(enc("uint256", json!(255)).unwrap()[31], 255);
        let mut minus_two = [0xff; 32];
        minus_two[31] = 0xfe;
        assert_eq!(enc("int256", json!(-2)).unwrap(), minus_two);

        assert_eq!(
            enc("uint256", json!("18446744073709551616")),
            Err(Eip712Error::IntRangeError)
        );
        assert_eq!(enc("uint64", json!("-1")), Err(Eip712Error::IntRangeError));
        assert_eq!(
            enc("int64", json!("9223372036854775808")),
            Err(Eip712Error::IntRangeError)
        );
        assert_eq!(enc("uint", json!("12abc")), Err(Eip712Error::JsonTypeWNoVal));
    }

    #[test]
    fn test_leaf_errors() {
        let types = Map::new();
        let enc = |ty: &str, v: Value| {
            let (kind, _) = kind_of(&types, ty)?;
            encode_leaf(kind, &v).map(|(w, _)| w)
        };

        assert_eq!(enc("address", json!("0x1234")), Err(Eip712Error::AddrStringVflow));
        assert_eq!(enc("address", json!(5)), Err(Eip712Error::AddrStringNull));
        assert_eq!(enc("bytes4", json!("0x0102030405")), Err(Eip712Error::BytesnSizeError));
        assert_eq!(enc("bytes", json!("0102")), Err(Eip712Error::BytesnStringError));
        assert_eq!(kind_of(&types, "bytes33"), Err(Eip712Error::TypeNotEncodable));
        assert_eq!(kind_of(&types, "uint7"), Err(Eip712Error::TypeNotEncodable));
        assert_eq!(kind_of(&types, "Missing"), Err(Eip712Error::UdefNameError));
        assert_eq!(kind_of(&types, "uint256[]"), Err(Eip712Error::IntArrayError));
        assert_eq!(kind_of(&types, "bytes32[]"), Err(Eip712Error::BytesnArrayError));
        assert_eq!(kind_of(&types, "bool[2]"), Err(Eip712Error::BoolArrayError));

        let mut padded = [0u8; 32];
        padded[..2].copy_from_slice(&[0xab, 0xcd]);
        assert_eq!(enc("bytes2", json!("0xabcd")).unwrap(), padded);
        assert_eq!(enc("bool", json!("true")).unwrap()[31], 1);
    }

    #[test]
    fn test_long_struct_array_name() {
        let mut types = Map::new();
        let long = "A".repeat(31);
        types.insert(long.clone(), json!([]));
        assert!(kind_of(&types, &long).is_ok());
        assert_eq!(
            kind_of(&types, &format!("{}[]", long)),
            Err(Eip712Error::UdefArrayNameErr)
        );
    }

    #[test]
    fn test_document_errors() {
        let bad = |v: Value| TypedData::from_value(v).err();
        assert_eq!(bad(json!([])), Some(Eip712Error::GeneralError));
        assert_eq!(bad(json!({"primaryType": "X"})), Some(Eip712Error::JsonTypesPropErr));
        assert_eq!(
            bad(json!({"types": {"X": []}, "primaryType": "X", "domain": {}, "message": {}})),
            Some(Eip712Error::MsgNoDs)
        );
        assert_eq!(
            bad(json!({"types": {"EIP712Domain": []}, "primaryType": "X", "domain": {}, "message": {}})),
            Some(Eip712Error::JsonPtypeValErr)
        );
        assert_eq!(
            bad(json!({"types": {"EIP712Domain": []}, "primaryType": "EIP712Domain", "message": {}})),
            Some(Eip712Error::JsonDPropErr)
        );
        assert_eq!(
            bad(json!({"types": {"EIP712Domain": []}, "primaryType": "EIP712Domain", "domain": {}})),
            Some(Eip712Error::JsonMPropErr)
        );
        assert_eq!(TypedData::parse("{not json").err(), Some(Eip712Error::GeneralError));
    }

    #[test]
    fn test_missing_value_fails_closed() {
        let data = doc(
            json!({"Msg": [{"name": "a", "type": "string"}, {"name": "b", "type": "string"}]}),
            "Msg",
            json!({"a": "x"}),
        )
        .unwrap();
        assert_eq!(hash_typed_data(&data), Err(Eip712Error::JsonNoPairVal));
    }

    #[test]
    fn test_null_message_hashes_domain_only() {
        let data = doc(json!({"Msg": [{"name": "a", "type": "string"}]}), "Msg", Value::Null).unwrap();
        let hash = hash_typed_data(&data).unwrap();
        assert_eq!(hash.message_hash, None);
        assert_eq!(hash.status(), NULL_MSG_HASH);

        let mut pre = vec![0x19, 0x01];
        pre.extend_from_slice(&hash.domain_separator);
        assert_eq!(hash.digest(), keccak256(&pre));
    }

    #[test]
    fn test_domain_is_one_prompt() {
        let data = doc(
            json!({"Msg": [{"name": "a", "type": "string"}, {"name": "n", "type": "uint8"}]}),
            "Msg",
            json!({"a": "hello", "n": 7}),
        )
        .unwrap();
        let mut ui = MockUi::new();
        confirm_typed_data(&mut ui, &data).unwrap();
        assert_eq!(ui.prompts.len(), 3);
        assert_eq!(ui.prompts[0].title, "EIP-712 domain");
        assert_eq!(ui.prompts[0].body, "name: Test\nchainId: 1");
        assert_eq!(ui.prompts[1].title, "a");
        assert_eq!(ui.prompts[1].body, "hello");
        assert_eq!(ui.prompts[2].body, "7");

        let mut ui = MockUi::scripted(&[false]);
        assert_eq!(
            confirm_typed_data(&mut ui, &data),
            Err(SignError::RejectedByUser)
        );
        assert_eq!(ui.prompts.len(), 1);
    }
}
