use alloy_sol_types::sol;

sol! {
    /// Public resolver records. Reads of a missing addr or content record
    /// revert.
    #[derive(Debug, PartialEq, Eq)]
    contract PublicResolver {
        function addr(bytes32 node) external view returns (address);
        function content(bytes32 node) external view returns (bytes32);
        function name(bytes32 node) external view returns (string);

        function setAddr(bytes32 node, address addr) external;
        function setContent(bytes32 node, bytes32 hash) external;
        function setName(bytes32 node, string name) external;
    }
}
