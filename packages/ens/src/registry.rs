use alloy_sol_types::sol;

sol! {
    /// ENS registry: owner, resolver and TTL of every node.
    #[derive(Debug, PartialEq, Eq)]
    contract EnsRegistry {
        event NewOwner(bytes32 indexed node, bytes32 indexed label, address owner);
        event Transfer(bytes32 indexed node, address owner);
        event NewResolver(bytes32 indexed node, address resolver);
        event NewTTL(bytes32 indexed node, uint64 ttl);

        function owner(bytes32 node) external view returns (address);
        function resolver(bytes32 node) external view returns (address);
        function ttl(bytes32 node) external view returns (uint64);

        function setOwner(bytes32 node, address owner) external;
        function setSubnodeOwner(bytes32 node, bytes32 label, address owner) external;
        function setResolver(bytes32 node, address resolver) external;
        function setTTL(bytes32 node, uint64 ttl) external;
    }
}
