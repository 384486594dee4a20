//! The template factory.
//!
//! Registers templates, derives counterfactual addresses and deploys proxies
//! against registered templates for a fee that ramps up with every deploy.

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::{SolInterface, SolValue};

use crate::abi::IFactory::{self, IFactoryCalls};
use crate::abi::{IAllowlist, IBeacon, IERC173};
use crate::access::{Ownable, initializer};
use crate::address::{Proxy, deploy_salt, derive_from_nonce};
use crate::beacon::UpgradeableBeacon;
use crate::chain::{CallContext, Contract, deployable};
use crate::error::{Error, Result};
use crate::registry::{TemplateEntry, TemplateMode, TemplateRegistry, TemplateUpdate};
use crate::token;

#[derive(Debug, Clone, Default)]
pub struct Factory {
    initialized: bool,
    ownable: Ownable,
    registry: TemplateRegistry,
    fee: U256,
    fee_to: Address,
    allowlist: Address,
}

/// Arguments shared by `deploy` and `deployWithSeed`.
struct DeployRequest {
    seed: Option<String>,
    use_beacon_proxy: bool,
    key: B256,
    init_data: Bytes,
    calls: Vec<Bytes>,
}

impl Factory {
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    // ─── Registration ───────────────────────────────────────────────────────

    fn add_template(
        &mut self,
        ctx: &mut CallContext<'_>,
        implementation: Address,
        owner: Address,
        price: U256,
    ) -> Result<B256> {
        self.ownable.only_owner(ctx)?;
        let key = self.registry.register(
            TemplateMode::Minimal,
            implementation,
            implementation,
            owner,
            price,
        )?;

        ctx.emit(&IFactory::NewTemplate {
            key,
            template: implementation,
            price,
        });
        tracing::info!(%key, %implementation, %price, "Registered template");
        Ok(key)
    }

    fn add_beacon(
        &mut self,
        ctx: &mut CallContext<'_>,
        implementation: Address,
        owner: Address,
        price: U256,
    ) -> Result<B256> {
        self.ownable.only_owner(ctx)?;
        let beacon = derive_from_nonce(ctx.this(), ctx.nonce());
        let key = self.registry.register(
            TemplateMode::Beacon,
            beacon,
            implementation,
            owner,
            price,
        )?;

        let created = ctx.create(deployable::<UpgradeableBeacon>())?;
        debug_assert_eq!(created, beacon);
        ctx.call_typed(created, &IBeacon::initializeCall { implementation })?;

        ctx.emit(&IFactory::NewTemplate {
            key,
            template: beacon,
            price,
        });
        tracing::info!(%key, %implementation, %beacon, %price, "Registered beacon template");
        Ok(key)
    }

    fn update_template(
        &mut self,
        ctx: &mut CallContext<'_>,
        key: B256,
        data: &[u8],
    ) -> Result<()> {
        let update = TemplateUpdate::decode(data)?;
        let entry = self
            .registry
            .update(&key, ctx.sender(), self.ownable.owner(), &update)?;

        if entry.mode == TemplateMode::Beacon {
            ctx.call_typed(
                entry.target,
                &IBeacon::upgradeToCall {
                    newImplementation: update.implementation,
                },
            )?;
        }

        ctx.emit(&IFactory::UpdatedTemplate {
            key,
            template: entry.target,
            owner: entry.owner,
            price: entry.price,
        });
        tracing::info!(%key, target = %entry.target, owner = %entry.owner, "Updated template");
        Ok(())
    }

    fn remove_template(&mut self, ctx: &mut CallContext<'_>, key: B256) -> Result<()> {
        self.ownable.only_owner(ctx)?;
        self.registry.remove(&key)?;
        ctx.emit(&IFactory::DeletedTemplate { key });
        tracing::info!(%key, "Removed template");
        Ok(())
    }

    // ─── Address derivation ─────────────────────────────────────────────────

    /// Current implementation behind `entry`, read through the beacon for beacon entries.
    fn live_implementation(ctx: &mut CallContext<'_>, entry: &TemplateEntry) -> Result<Address> {
        match entry.mode {
            TemplateMode::Minimal => Ok(entry.target),
            TemplateMode::Beacon => ctx.call_typed(entry.target, &IBeacon::implementationCall {}),
        }
    }

    fn proxy_for(
        ctx: &mut CallContext<'_>,
        entry: &TemplateEntry,
        use_beacon_proxy: bool,
    ) -> Result<Proxy> {
        match (use_beacon_proxy, entry.mode) {
            (true, TemplateMode::Beacon) => Ok(Proxy::Beacon {
                beacon: entry.target,
            }),
            (true, TemplateMode::Minimal) => Err(Error::NonValid),
            (false, _) => Ok(Proxy::Minimal {
                implementation: Self::live_implementation(ctx, entry)?,
            }),
        }
    }

    fn compute(
        &self,
        ctx: &mut CallContext<'_>,
        seed: Option<&str>,
        use_beacon_proxy: bool,
        key: B256,
        init_data: &[u8],
    ) -> Result<Address> {
        let entry = self.registry.get(&key)?;
        let proxy = Self::proxy_for(ctx, entry, use_beacon_proxy)?;
        Ok(proxy.derive(ctx.this(), deploy_salt(seed, init_data)))
    }

    // ─── Deployment ─────────────────────────────────────────────────────────

    fn is_allowlisted(&self, ctx: &mut CallContext<'_>, account: Address) -> Result<bool> {
        if self.allowlist.is_zero() {
            return Ok(false);
        }
        ctx.call_typed(self.allowlist, &IAllowlist::allowanceCall { account })
    }

    fn deploy(&mut self, ctx: &mut CallContext<'_>, request: DeployRequest) -> Result<Address> {
        let entry = self.registry.get(&request.key)?.clone();
        let price = self.registry.accrue(&request.key)?;

        let sender = ctx.sender();
        let is_template_owner = !entry.owner.is_zero() && entry.owner == sender;
        let required = if is_template_owner || self.is_allowlisted(ctx, sender)? {
            U256::ZERO
        } else {
            price
        };
        if ctx.value() < required {
            return Err(Error::IncorrectAmounts);
        }

        let proxy = Self::proxy_for(ctx, &entry, request.use_beacon_proxy)?;
        let salt = deploy_salt(request.seed.as_deref(), &request.init_data);
        let deployed = self.spawn(ctx, proxy, salt, &request.init_data, &request.calls)?;
        tracing::info!(key = %request.key, %deployed, deployer = %sender, %price, "Deployed template");
        Ok(deployed)
    }

    fn clone_implementation(
        &mut self,
        ctx: &mut CallContext<'_>,
        implementation: Address,
        init_data: &[u8],
        calls: &[Bytes],
    ) -> Result<Address> {
        let registered = [TemplateMode::Minimal, TemplateMode::Beacon]
            .into_iter()
            .any(|mode| self.registry.is_registered(mode, implementation));
        if registered {
            return Err(Error::NonValid);
        }

        let sender = ctx.sender();
        let required = if self.is_allowlisted(ctx, sender)? {
            U256::ZERO
        } else {
            self.fee
        };
        if ctx.value() < required {
            return Err(Error::IncorrectAmounts);
        }

        let proxy = Proxy::Minimal { implementation };
        let deployed = self.spawn(ctx, proxy, deploy_salt(None, init_data), init_data, calls)?;
        tracing::info!(%implementation, %deployed, deployer = %sender, "Cloned implementation");
        Ok(deployed)
    }

    /// Create the proxy, run its initializer and follow-up calls, then forward the payment.
    fn spawn(
        &self,
        ctx: &mut CallContext<'_>,
        proxy: Proxy,
        salt: B256,
        init_data: &[u8],
        calls: &[Bytes],
    ) -> Result<Address> {
        let deployed = ctx.create2(salt, proxy)?;
        if !init_data.is_empty() {
            ctx.call(deployed, U256::ZERO, init_data)?;
        }
        for call in calls {
            ctx.call(deployed, U256::ZERO, call)?;
        }

        let paid = ctx.value();
        if !paid.is_zero() && !self.fee_to.is_zero() {
            ctx.transfer_native(self.fee_to, paid)?;
        }

        ctx.emit(&IFactory::Deployed {
            deployed,
            deployer: ctx.sender(),
        });
        Ok(deployed)
    }

    // ─── Administration ─────────────────────────────────────────────────────

    fn collect(&mut self, ctx: &mut CallContext<'_>, token: Address) -> Result<()> {
        self.ownable.only_owner(ctx)?;
        let to = self.ownable.owner();
        if token.is_zero() {
            let amount = ctx.balance();
            ctx.transfer_native(to, amount)?;
            tracing::info!(%to, %amount, "Collected native balance");
        } else {
            let this = ctx.this();
            let amount = token::balance_of(ctx, token, this)?;
            token::safe_transfer(ctx, token, to, amount)?;
            tracing::info!(%token, %to, %amount, "Collected token balance");
        }
        Ok(())
    }

    fn change_fee(&mut self, ctx: &mut CallContext<'_>, fee: U256) -> Result<()> {
        self.ownable.only_owner(ctx)?;
        let previous = std::mem::replace(&mut self.fee, fee);
        ctx.emit(&IFactory::FeeChanged {
            previous,
            current: fee,
        });
        Ok(())
    }

    fn change_fee_to(&mut self, ctx: &mut CallContext<'_>, fee_to: Address) -> Result<()> {
        self.ownable.only_owner(ctx)?;
        let previous = std::mem::replace(&mut self.fee_to, fee_to);
        ctx.emit(&IFactory::FeeToChanged {
            previous,
            current: fee_to,
        });
        Ok(())
    }

    fn recover_ownership(
        &mut self,
        ctx: &mut CallContext<'_>,
        deployed: Address,
        new_owner: Address,
    ) -> Result<()> {
        self.ownable.only_owner(ctx)?;
        ctx.call_typed(deployed, &IERC173::transferOwnershipCall { newOwner: new_owner })?;
        tracing::info!(%deployed, %new_owner, "Recovered instance ownership");
        Ok(())
    }
}

impl Contract for Factory {
    const LABEL: &'static str = "Factory";

    fn dispatch(&mut self, ctx: &mut CallContext<'_>, input: &[u8]) -> Result<Bytes> {
        let call = IFactoryCalls::abi_decode(input)?;
        let payable = matches!(
            call,
            IFactoryCalls::deploy(_) | IFactoryCalls::deployWithSeed(_) | IFactoryCalls::clone(_)
        );
        if !payable {
            ctx.ensure_non_payable()?;
        }

        let output = match call {
            IFactoryCalls::initialize(call) => {
                initializer(&mut self.initialized)?;
                let owner = ctx.sender();
                self.ownable.init(ctx, owner);
                self.fee = call.fee;
                self.fee_to = call.feeTo;
                self.allowlist = call.allowlist;
                Vec::new()
            }
            IFactoryCalls::owner(_) => self.ownable.owner().abi_encode(),
            IFactoryCalls::transferOwnership(call) => {
                self.ownable.transfer(ctx, call.newOwner)?;
                Vec::new()
            }
            IFactoryCalls::nonce(_) => self.registry.nonce().abi_encode(),
            IFactoryCalls::fee(_) => self.fee.abi_encode(),
            IFactoryCalls::feeTo(_) => self.fee_to.abi_encode(),
            IFactoryCalls::allowlist(_) => self.allowlist.abi_encode(),
            IFactoryCalls::templates(call) => {
                let entry = self.registry.get(&call.key)?;
                (
                    entry.target,
                    entry.owner,
                    entry.price,
                    entry.mode == TemplateMode::Beacon,
                )
                    .abi_encode()
            }
            IFactoryCalls::resolve(call) => {
                let entry = self.registry.get(&call.key)?.clone();
                Self::live_implementation(ctx, &entry)?.abi_encode()
            }
            IFactoryCalls::getPrice(call) => self.registry.get(&call.key)?.price.abi_encode(),
            IFactoryCalls::addTemplate(call) => self
                .add_template(ctx, call.implementation, call.owner, call.price)?
                .abi_encode(),
            IFactoryCalls::addBeacon(call) => self
                .add_beacon(ctx, call.implementation, call.owner, call.price)?
                .abi_encode(),
            IFactoryCalls::updateTemplate(call) => {
                self.update_template(ctx, call.key, &call.data)?;
                Vec::new()
            }
            IFactoryCalls::removeTemplate(call) => {
                self.remove_template(ctx, call.key)?;
                Vec::new()
            }
            IFactoryCalls::compute(call) => self
                .compute(ctx, None, call.useBeaconProxy, call.key, &call.initData)?
                .abi_encode(),
            IFactoryCalls::computeWithSeed(call) => self
                .compute(
                    ctx,
                    Some(call.seed.as_str()),
                    call.useBeaconProxy,
                    call.key,
                    &call.initData,
                )?
                .abi_encode(),
            IFactoryCalls::deploy(call) => self
                .deploy(
                    ctx,
                    DeployRequest {
                        seed: None,
                        use_beacon_proxy: call.useBeaconProxy,
                        key: call.key,
                        init_data: call.initData,
                        calls: call.calls,
                    },
                )?
                .abi_encode(),
            IFactoryCalls::deployWithSeed(call) => self
                .deploy(
                    ctx,
                    DeployRequest {
                        seed: Some(call.seed),
                        use_beacon_proxy: call.useBeaconProxy,
                        key: call.key,
                        init_data: call.initData,
                        calls: call.calls,
                    },
                )?
                .abi_encode(),
            IFactoryCalls::clone(call) => self
                .clone_implementation(ctx, call.implementation, &call.initData, &call.calls)?
                .abi_encode(),
            IFactoryCalls::collect(call) => {
                self.collect(ctx, call.token)?;
                Vec::new()
            }
            IFactoryCalls::changeFee(call) => {
                self.change_fee(ctx, call.newFee)?;
                Vec::new()
            }
            IFactoryCalls::changeFeeTo(call) => {
                self.change_fee_to(ctx, call.newFeeTo)?;
                Vec::new()
            }
            IFactoryCalls::recoverOwnership(call) => {
                self.recover_ownership(ctx, call.deployed, call.newOwner)?;
                Vec::new()
            }
        };
        Ok(output.into())
    }
}
