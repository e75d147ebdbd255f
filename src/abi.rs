/// Raw JSON interface descriptor of the order contract, the source of the
/// event topics the history tracker queries for.
pub const ORDER_DESCRIPTOR: &str = include_str!("../abi/TermMaxOrder.json");

/// Raw JSON interface descriptor of the market contract.
pub const MARKET_DESCRIPTOR: &str = include_str!("../abi/TermMaxMarket.json");

#[allow(clippy::too_many_arguments)]
pub mod order {
    alloy::sol!(
        #[derive(Debug)]
        #[sol(rpc)]
        TermMaxOrder,
        "abi/TermMaxOrder.json"
    );
}

#[allow(clippy::too_many_arguments)]
pub mod market {
    alloy::sol!(
        #[derive(Debug)]
        #[sol(rpc)]
        TermMaxMarket,
        "abi/TermMaxMarket.json"
    );
}

pub mod erc20 {
    alloy::sol!(
        /// ERC-20 metadata extension, enough to label and scale token amounts.
        #[derive(Debug)]
        #[sol(rpc)]
        interface IERC20Metadata {
            function name() external view returns (string);
            function symbol() external view returns (string);
            function decimals() external view returns (uint8);
        }
    );
}
