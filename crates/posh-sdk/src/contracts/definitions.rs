//! Static ABI descriptors for the PoSH contracts.

use super::abi::{AbiEvent, AbiFunction, AbiParam, AbiType, StateMutability};

// =============================================================================
// HumanIdentity
// =============================================================================

/// HumanIdentity contract surface.
pub mod human_identity {
    use super::*;

    /// Solidity contract name.
    pub const CONTRACT: &str = "HumanIdentity";

    /// `register()`
    pub const REGISTER: AbiFunction = AbiFunction {
        name: "register",
        inputs: &[],
        outputs: &[AbiType::FixedBytes32],
        mutability: StateMutability::NonPayable,
    };

    /// `isRegistered(address) -> bool`
    pub const IS_REGISTERED: AbiFunction = AbiFunction {
        name: "isRegistered",
        inputs: &[AbiParam::new("wallet", AbiType::Address)],
        outputs: &[AbiType::Bool],
        mutability: StateMutability::View,
    };

    /// `getHumanId(address) -> bytes32`
    pub const GET_HUMAN_ID: AbiFunction = AbiFunction {
        name: "getHumanId",
        inputs: &[AbiParam::new("wallet", AbiType::Address)],
        outputs: &[AbiType::FixedBytes32],
        mutability: StateMutability::View,
    };

    /// `getWallet(bytes32) -> address`
    pub const GET_WALLET: AbiFunction = AbiFunction {
        name: "getWallet",
        inputs: &[AbiParam::new("humanId", AbiType::FixedBytes32)],
        outputs: &[AbiType::Address],
        mutability: StateMutability::View,
    };

    /// `getRegistrationTime(bytes32) -> uint256`
    pub const GET_REGISTRATION_TIME: AbiFunction = AbiFunction {
        name: "getRegistrationTime",
        inputs: &[AbiParam::new("humanId", AbiType::FixedBytes32)],
        outputs: &[AbiType::Uint(256)],
        mutability: StateMutability::View,
    };

    /// `linkExternalProof(bytes32, string)`
    pub const LINK_EXTERNAL_PROOF: AbiFunction = AbiFunction {
        name: "linkExternalProof",
        inputs: &[
            AbiParam::new("proofHash", AbiType::FixedBytes32),
            AbiParam::new("provider", AbiType::String),
        ],
        outputs: &[],
        mutability: StateMutability::NonPayable,
    };

    /// `HumanRegistered(bytes32 indexed, address indexed, uint256)`
    pub const HUMAN_REGISTERED: AbiEvent = AbiEvent {
        name: "HumanRegistered",
        inputs: &[
            AbiParam::indexed("humanId", AbiType::FixedBytes32),
            AbiParam::indexed("wallet", AbiType::Address),
            AbiParam::new("timestamp", AbiType::Uint(256)),
        ],
    };

    /// `IdentityLinked(bytes32 indexed, bytes32, string, uint256)`
    pub const IDENTITY_LINKED: AbiEvent = AbiEvent {
        name: "IdentityLinked",
        inputs: &[
            AbiParam::indexed("humanId", AbiType::FixedBytes32),
            AbiParam::new("proofHash", AbiType::FixedBytes32),
            AbiParam::new("provider", AbiType::String),
            AbiParam::new("timestamp", AbiType::Uint(256)),
        ],
    };
}

// =============================================================================
// ProofRegistry
// =============================================================================

/// ProofRegistry contract surface.
pub mod proof_registry {
    use super::*;

    /// Solidity contract name.
    pub const CONTRACT: &str = "ProofRegistry";

    /// `getProofCount(bytes32) -> uint256`
    pub const GET_PROOF_COUNT: AbiFunction = AbiFunction {
        name: "getProofCount",
        inputs: &[AbiParam::new("humanId", AbiType::FixedBytes32)],
        outputs: &[AbiType::Uint(256)],
        mutability: StateMutability::View,
    };

    /// `getProof(bytes32)`
    pub const GET_PROOF: AbiFunction = AbiFunction {
        name: "getProof",
        inputs: &[AbiParam::new("proofId", AbiType::FixedBytes32)],
        outputs: &[
            AbiType::FixedBytes32,
            AbiType::Uint(8),
            AbiType::Uint(256),
            AbiType::Uint(8),
            AbiType::Uint(256),
        ],
        mutability: StateMutability::View,
    };

    /// `getHumanProofs(bytes32) -> bytes32[]`
    pub const GET_HUMAN_PROOFS: AbiFunction = AbiFunction {
        name: "getHumanProofs",
        inputs: &[AbiParam::new("humanId", AbiType::FixedBytes32)],
        outputs: &[AbiType::Bytes32Array],
        mutability: StateMutability::View,
    };

    /// `ProofRegistered(bytes32 indexed, bytes32 indexed, uint8, uint256, uint8)`
    pub const PROOF_REGISTERED: AbiEvent = AbiEvent {
        name: "ProofRegistered",
        inputs: &[
            AbiParam::indexed("proofId", AbiType::FixedBytes32),
            AbiParam::indexed("humanId", AbiType::FixedBytes32),
            AbiParam::new("impactType", AbiType::Uint(8)),
            AbiParam::new("impactValue", AbiType::Uint(256)),
            AbiParam::new("tier", AbiType::Uint(8)),
        ],
    };
}

// =============================================================================
// HumanScore
// =============================================================================

/// HumanScore contract surface.
pub mod human_score {
    use super::*;

    /// Solidity contract name.
    pub const CONTRACT: &str = "HumanScore";

    /// `getScore(bytes32) -> uint256`
    pub const GET_SCORE: AbiFunction = AbiFunction {
        name: "getScore",
        inputs: &[AbiParam::new("humanId", AbiType::FixedBytes32)],
        outputs: &[AbiType::Uint(256)],
        mutability: StateMutability::View,
    };

    /// `getLevel(bytes32) -> uint8`
    pub const GET_LEVEL: AbiFunction = AbiFunction {
        name: "getLevel",
        inputs: &[AbiParam::new("humanId", AbiType::FixedBytes32)],
        outputs: &[AbiType::Uint(8)],
        mutability: StateMutability::View,
    };

    /// `getTierBreakdown(bytes32)`
    pub const GET_TIER_BREAKDOWN: AbiFunction = AbiFunction {
        name: "getTierBreakdown",
        inputs: &[AbiParam::new("humanId", AbiType::FixedBytes32)],
        outputs: &[AbiType::Uint(256), AbiType::Uint(256), AbiType::Uint(256)],
        mutability: StateMutability::View,
    };
}

// =============================================================================
// PoSHNFT (badges)
// =============================================================================

/// Badge registry (ERC-721) surface.
pub mod badge_registry {
    use super::*;

    /// Solidity contract name.
    pub const CONTRACT: &str = "PoSHNFT";

    /// `balanceOf(address) -> uint256`
    pub const BALANCE_OF: AbiFunction = AbiFunction {
        name: "balanceOf",
        inputs: &[AbiParam::new("owner", AbiType::Address)],
        outputs: &[AbiType::Uint(256)],
        mutability: StateMutability::View,
    };
}
