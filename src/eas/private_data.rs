//! Private data attestations.
//!
//! Typed fields are hashed into a Merkle tree whose root is attested under
//! the `bytes32 privateData` schema. Any subset of fields can later be
//! disclosed with a multi-proof against that root.
//!
//! The tree uses the standard array layout: leaf hashes are sorted, stored
//! at the tail of the node array in reverse, and `nodes[i]` hashes the
//! sorted pair `(nodes[2i + 1], nodes[2i + 2])`. Roots and proofs are
//! therefore interchangeable with other EAS private data tooling.

use std::collections::VecDeque;

use alloy::dyn_abi::{DynSolType, DynSolValue};
use alloy::primitives::{keccak256, B256};
use serde::{Deserialize, Serialize};

use crate::config::PrivateFieldConfig;
use crate::eas::schema::coerce_value;
use crate::eas::types::{EasError, EasResult};

/// Schema every private data root is attested under.
pub const PRIVATE_DATA_SCHEMA: &str = "bytes32 privateData";

/// Keccak-256 of the sorted pair.
pub fn hash_pair(a: B256, b: B256) -> B256 {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(low.as_slice());
    buf[32..].copy_from_slice(high.as_slice());
    keccak256(buf)
}

/// One private field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: serde_json::Value,
}

impl PrivateField {
    /// `keccak256(keccak256(abi.encode(type, name, abi.encode(value))))`.
    pub fn leaf(&self) -> EasResult<B256> {
        let encoding_error = |reason: String| EasError::Encoding {
            field: self.name.clone(),
            reason,
        };
        let ty = DynSolType::parse(&self.type_name).map_err(|e| encoding_error(e.to_string()))?;
        let value = coerce_value(&ty, &self.value).map_err(encoding_error)?;
        let encoded_value = DynSolValue::Tuple(vec![value]).abi_encode_params();

        let node = DynSolValue::Tuple(vec![
            DynSolValue::String(self.type_name.clone()),
            DynSolValue::String(self.name.clone()),
            DynSolValue::Bytes(encoded_value),
        ])
        .abi_encode_params();
        Ok(keccak256(keccak256(node)))
    }
}

impl From<&PrivateFieldConfig> for PrivateField {
    fn from(config: &PrivateFieldConfig) -> Self {
        Self {
            name: config.name.clone(),
            type_name: config.type_name.clone(),
            value: config.value.clone(),
        }
    }
}

/// Node index of the leaf at `position` in sorted order.
fn node_index(position: usize, total_leaves: usize) -> usize {
    2 * total_leaves - 2 - position
}

fn sibling(index: usize) -> usize {
    if index % 2 == 1 {
        index + 1
    } else {
        index - 1
    }
}

fn parent(index: usize) -> usize {
    (index - 1) / 2
}

/// Walk from the given leaf node indices up to the root. Yields, per
/// hashing step, whether the sibling is already known and, when it is not,
/// the node index the proof must supply.
fn multi_proof_steps(node_indices: &[usize]) -> Vec<(bool, Option<usize>)> {
    let mut stack: VecDeque<usize> = node_indices.iter().copied().collect();
    stack.make_contiguous().sort_unstable_by(|a, b| b.cmp(a));

    let mut steps = Vec::new();
    while let Some(&index) = stack.front() {
        if index == 0 {
            break;
        }
        stack.pop_front();
        let sibling = sibling(index);
        if stack.front() == Some(&sibling) {
            stack.pop_front();
            steps.push((true, None));
        } else {
            steps.push((false, Some(sibling)));
        }
        stack.push_back(parent(index));
    }
    steps
}

/// Fold `leaves` (in descending node order) with `proof` hashes as directed
/// by `flags`. `None` if the shapes do not line up.
fn process_multi_proof(leaves: &[B256], proof: &[B256], flags: &[bool]) -> Option<B256> {
    if leaves.len() + proof.len() != flags.len() + 1 {
        return None;
    }
    let mut stack: VecDeque<B256> = leaves.iter().copied().collect();
    let mut proof = proof.iter().copied();
    for &known in flags {
        let a = stack.pop_front()?;
        let b = if known { stack.pop_front()? } else { proof.next()? };
        stack.push_back(hash_pair(a, b));
    }
    stack.pop_back().or_else(|| proof.next())
}

/// A set of private fields and their Merkle tree.
#[derive(Debug)]
pub struct PrivateData {
    fields: Vec<PrivateField>,
    /// Sorted position of each field's leaf.
    positions: Vec<usize>,
    nodes: Vec<B256>,
}

impl PrivateData {
    pub fn new(fields: Vec<PrivateField>) -> EasResult<Self> {
        if fields.is_empty() {
            return Err(EasError::Proof("no private fields".to_string()));
        }
        let mut seen = std::collections::HashSet::new();
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(EasError::Proof(format!("duplicate field '{}'", field.name)));
            }
        }

        let leaves = fields
            .iter()
            .map(PrivateField::leaf)
            .collect::<EasResult<Vec<_>>>()?;

        let mut order: Vec<usize> = (0..leaves.len()).collect();
        order.sort_by_key(|&i| leaves[i]);
        let mut positions = vec![0; leaves.len()];
        for (position, &field) in order.iter().enumerate() {
            positions[field] = position;
        }

        let total = leaves.len();
        let mut nodes = vec![B256::ZERO; 2 * total - 1];
        for (position, &field) in order.iter().enumerate() {
            nodes[node_index(position, total)] = leaves[field];
        }
        for i in (0..total - 1).rev() {
            nodes[i] = hash_pair(nodes[2 * i + 1], nodes[2 * i + 2]);
        }

        Ok(Self {
            fields,
            positions,
            nodes,
        })
    }

    pub fn fields(&self) -> &[PrivateField] {
        &self.fields
    }

    pub fn root(&self) -> B256 {
        self.nodes[0]
    }

    /// Multi-proof revealing the named fields and nothing else.
    pub fn disclose(&self, names: &[String]) -> EasResult<DisclosureProof> {
        let mut disclosed = Vec::with_capacity(names.len());
        for name in names {
            let field = self
                .fields
                .iter()
                .position(|f| &f.name == name)
                .ok_or_else(|| EasError::Proof(format!("unknown field '{}'", name)))?;
            disclosed.push((self.positions[field], field));
        }
        disclosed.sort_unstable();
        disclosed.dedup();
        if disclosed.is_empty() {
            return Err(EasError::Proof("nothing to disclose".to_string()));
        }

        let total = self.fields.len();
        let node_indices: Vec<usize> = disclosed
            .iter()
            .map(|&(position, _)| node_index(position, total))
            .collect();
        let steps = multi_proof_steps(&node_indices);

        Ok(DisclosureProof {
            root: self.root(),
            total_leaves: total,
            fields: disclosed
                .iter()
                .map(|&(index, field)| DisclosedField {
                    index,
                    field: self.fields[field].clone(),
                })
                .collect(),
            proof: steps
                .iter()
                .filter_map(|&(_, node)| node.map(|i| self.nodes[i]))
                .collect(),
            proof_flags: steps.iter().map(|&(known, _)| known).collect(),
        })
    }
}

/// A disclosed field with the position of its leaf among the sorted leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosedField {
    pub index: usize,
    #[serde(flatten)]
    pub field: PrivateField,
}

/// Fields revealed from a private data tree, with the hashes needed to
/// rebuild its root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisclosureProof {
    pub root: B256,
    pub total_leaves: usize,
    pub fields: Vec<DisclosedField>,
    pub proof: Vec<B256>,
    pub proof_flags: Vec<bool>,
}

impl DisclosureProof {
    /// Check the disclosed fields hash up to `self.root`.
    pub fn verify(&self) -> EasResult<()> {
        let mut disclosed = self.fields.clone();
        disclosed.sort_by_key(|d| d.index);
        if disclosed.iter().any(|d| d.index >= self.total_leaves) {
            return Err(EasError::Proof("leaf index out of range".to_string()));
        }
        if disclosed.windows(2).any(|w| w[0].index == w[1].index) {
            return Err(EasError::Proof("leaf index disclosed twice".to_string()));
        }

        let node_indices: Vec<usize> = disclosed
            .iter()
            .map(|d| node_index(d.index, self.total_leaves))
            .collect();
        let expected_flags: Vec<bool> = multi_proof_steps(&node_indices)
            .iter()
            .map(|&(known, _)| known)
            .collect();
        if expected_flags != self.proof_flags {
            return Err(EasError::Proof(
                "proof flags do not match the disclosed positions".to_string(),
            ));
        }

        let leaves = disclosed
            .iter()
            .map(|d| d.field.leaf())
            .collect::<EasResult<Vec<_>>>()?;
        match process_multi_proof(&leaves, &self.proof, &self.proof_flags) {
            Some(root) if root == self.root => Ok(()),
            _ => Err(EasError::Proof(format!("fields do not hash to root {}", self.root))),
        }
    }

    /// Like `verify`, and also require the proof to be for `root`.
    pub fn verify_against(&self, root: B256) -> EasResult<()> {
        if self.root != root {
            return Err(EasError::Proof(format!(
                "proof is for root {}, expected {}",
                self.root, root
            )));
        }
        self.verify()
    }
}
