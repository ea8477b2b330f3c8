use alloy_sol_types::sol;

sol! {
    /// Owner of `addr.reverse`. Every call acts on the sender's reverse node.
    #[derive(Debug, PartialEq, Eq)]
    contract ReverseRegistrar {
        function defaultResolver() external view returns (address);
        function node(address addr) external pure returns (bytes32);

        /// Transfers the sender's reverse node to `owner`.
        function claim(address owner) external returns (bytes32);
        function claimWithResolver(address owner, address resolver) external returns (bytes32);
        /// Claims the sender's reverse node for the registrar with its
        /// default resolver and writes `name` there.
        function setName(string name) external returns (bytes32);
    }
}
