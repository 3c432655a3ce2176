//! Contract bindings. Each ABI lives in its own module so the generated
//! `*Call` structs do not collide.

pub mod erc20 {
    use ethers::contract::abigen;

    abigen!(
        Erc20,
        r"[
            function balanceOf(address owner) view returns (uint256)
            function allowance(address owner, address spender) view returns (uint256)
            function approve(address spender, uint256 amount) returns (bool)
        ]",
    );
}

pub mod permit2 {
    use ethers::contract::abigen;

    abigen!(
        Permit2,
        r"[
            function allowance(address owner, address token, address spender) view returns (uint160 amount, uint48 expiration, uint48 nonce)
            function approve(address token, address spender, uint160 amount, uint48 expiration)
        ]",
    );
}

pub mod pool {
    use ethers::contract::abigen;

    abigen!(
        UniswapV3Pool,
        r"[
            function slot0() view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked)
            function liquidity() view returns (uint128)
        ]",
    );
}

pub mod quoter {
    use ethers::contract::abigen;

    abigen!(
        QuoterV2,
        r"[
            struct QuoteExactOutputSingleParams { address tokenIn; address tokenOut; uint256 amount; uint24 fee; uint160 sqrtPriceLimitX96; }
            function quoteExactOutputSingle(QuoteExactOutputSingleParams params) returns (uint256 amountIn, uint160 sqrtPriceX96After, uint32 initializedTicksCrossed, uint256 gasEstimate)
        ]",
    );
}

pub mod router {
    use ethers::contract::abigen;

    abigen!(
        UniversalRouter,
        r"[
            function execute(bytes commands, bytes[] inputs, uint256 deadline) payable
        ]",
    );
}
