//! Service types shared with the handlers through `web::Data`

use loyalty_db::{
    PgAccrualOrderRepository, PgLedgerRepository, PgRewardRepository, PgUserOrderRepository,
    PgUserRepository,
};
use loyalty_services::{
    AccrualOrderRegistry, LedgerService, MartOrderService, RewardRegistry, UserService,
};

// Accrual service
pub type PgRewardRegistry = RewardRegistry<PgRewardRepository>;
pub type PgAccrualOrderRegistry = AccrualOrderRegistry<PgAccrualOrderRepository>;

// Mart service
pub type PgUserService = UserService<PgUserRepository>;
pub type PgMartOrderService = MartOrderService<PgUserOrderRepository>;
pub type PgLedgerService = LedgerService<PgLedgerRepository>;
